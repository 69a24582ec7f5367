//! Policy catalog: leave types, packages, workflows, delegations, block
//! periods and the employee directory read model.
//!
//! Configuration changes rarely and is read on every submission, so it is
//! held behind read-mostly locks rather than versioned maps.

use chrono::NaiveDate;
use dashmap::DashMap;
use furlough_core::collab::DelegationLookup;
use furlough_core::policy::{
    ApprovalWorkflow, EmployeeProfile, LeaveBlockPeriod, LeaveType, ManagerDelegation, VacationPackage,
};
use furlough_shared::types::{EmployeeId, LeaveTypeId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::collab::RoleAssignment;
use crate::error::StoreError;

/// Serialized catalog contents, as loaded by the scheduler at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    /// Leave types.
    pub leave_types: Vec<LeaveType>,
    /// Employee directory.
    pub employees: Vec<EmployeeProfile>,
    /// Vacation packages.
    pub packages: Vec<VacationPackage>,
    /// Approval workflows.
    pub workflows: Vec<ApprovalWorkflow>,
    /// Manager delegations.
    pub delegations: Vec<ManagerDelegation>,
    /// Block periods.
    pub block_periods: Vec<LeaveBlockPeriod>,
    /// Org chart rows.
    pub org_chart: Vec<RoleAssignment>,
}

impl CatalogSeed {
    /// Parses a JSON seed.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::InvalidSeed(e.to_string()))
    }
}

/// In-memory policy catalog.
#[derive(Debug, Default)]
pub struct PolicyCatalog {
    leave_types: DashMap<LeaveTypeId, LeaveType>,
    employees: DashMap<EmployeeId, EmployeeProfile>,
    packages: RwLock<Vec<VacationPackage>>,
    workflows: RwLock<Vec<ApprovalWorkflow>>,
    delegations: RwLock<Vec<ManagerDelegation>>,
    block_periods: RwLock<Vec<LeaveBlockPeriod>>,
}

impl PolicyCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a seed. The seed's org chart is not part of
    /// the catalog.
    #[must_use]
    pub fn from_seed(seed: &CatalogSeed) -> Self {
        let catalog = Self::new();
        for lt in &seed.leave_types {
            catalog.upsert_leave_type(lt.clone());
        }
        for e in &seed.employees {
            catalog.upsert_employee(e.clone());
        }
        catalog.packages.write().extend(seed.packages.iter().cloned());
        catalog.workflows.write().extend(seed.workflows.iter().cloned());
        catalog.delegations.write().extend(seed.delegations.iter().cloned());
        catalog.block_periods.write().extend(seed.block_periods.iter().cloned());
        catalog
    }

    // ========== Leave types ==========

    /// Adds or replaces a leave type.
    pub fn upsert_leave_type(&self, leave_type: LeaveType) {
        self.leave_types.insert(leave_type.id, leave_type);
    }

    /// Looks up a leave type.
    pub fn leave_type(&self, id: LeaveTypeId) -> Option<LeaveType> {
        self.leave_types.get(&id).map(|r| r.value().clone())
    }

    /// Retires a leave type; it is never deleted.
    pub fn deactivate_leave_type(&self, id: LeaveTypeId) -> bool {
        self.leave_types
            .get_mut(&id)
            .map(|mut lt| lt.is_active = false)
            .is_some()
    }

    /// Every leave type.
    pub fn leave_types(&self) -> Vec<LeaveType> {
        self.leave_types.iter().map(|r| r.value().clone()).collect()
    }

    // ========== Employees ==========

    /// Adds or replaces an employee profile.
    pub fn upsert_employee(&self, employee: EmployeeProfile) {
        self.employees.insert(employee.id, employee);
    }

    /// Looks up an employee.
    pub fn employee(&self, id: EmployeeId) -> Option<EmployeeProfile> {
        self.employees.get(&id).map(|r| r.value().clone())
    }

    /// Every employee.
    pub fn employees(&self) -> Vec<EmployeeProfile> {
        self.employees.iter().map(|r| r.value().clone()).collect()
    }

    /// Colleagues in the same department, the employee excluded.
    pub fn department_of(&self, employee: &EmployeeProfile) -> Vec<EmployeeProfile> {
        self.employees
            .iter()
            .filter(|r| r.department_id == employee.department_id && r.id != employee.id)
            .map(|r| r.value().clone())
            .collect()
    }

    // ========== Policies ==========

    /// Adds a vacation package.
    pub fn add_package(&self, package: VacationPackage) {
        self.packages.write().push(package);
    }

    /// The package governing `employee` for `leave_type_id` on `on`.
    pub fn package_for(
        &self,
        employee: &EmployeeProfile,
        leave_type_id: LeaveTypeId,
        on: NaiveDate,
    ) -> Option<VacationPackage> {
        let packages = self.packages.read();
        VacationPackage::select(&packages, employee, leave_type_id, on).cloned()
    }

    /// Adds an approval workflow.
    pub fn add_workflow(&self, workflow: ApprovalWorkflow) {
        self.workflows.write().push(workflow);
    }

    /// Every configured workflow.
    pub fn workflows(&self) -> Vec<ApprovalWorkflow> {
        self.workflows.read().clone()
    }

    /// Adds a delegation.
    pub fn add_delegation(&self, delegation: ManagerDelegation) {
        self.delegations.write().push(delegation);
    }

    /// Adds a block period.
    pub fn add_block_period(&self, block: LeaveBlockPeriod) {
        self.block_periods.write().push(block);
    }

    /// Active block periods.
    pub fn block_periods(&self) -> Vec<LeaveBlockPeriod> {
        self.block_periods
            .read()
            .iter()
            .filter(|b| b.is_active)
            .cloned()
            .collect()
    }
}

impl DelegationLookup for PolicyCatalog {
    fn active_delegate(&self, manager_id: EmployeeId, on: NaiveDate) -> Option<ManagerDelegation> {
        self.delegations
            .read()
            .iter()
            .find(|d| d.manager_id == manager_id && d.is_in_force(on))
            .cloned()
    }
}
