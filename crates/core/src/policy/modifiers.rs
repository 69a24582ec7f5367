//! Manager delegations and leave block periods.
//!
//! Neither is a state machine; both are consulted by the workflow.

use chrono::NaiveDate;
use furlough_shared::types::{BlockPeriodId, DateRange, DelegationId, DepartmentId, EmployeeId, LeaveTypeId};
use serde::{Deserialize, Serialize};

use super::employee::EmployeeProfile;

/// A manager handing approval authority to a delegate for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerDelegation {
    /// Identifier.
    pub id: DelegationId,
    /// Who delegates.
    pub manager_id: EmployeeId,
    /// Who acts instead.
    pub delegate_id: EmployeeId,
    /// When the delegation is in force.
    pub period: DateRange,
    /// Delegate may approve.
    pub can_approve: bool,
    /// Delegate may reject.
    pub can_reject: bool,
    /// Revoked delegations are ignored.
    pub is_active: bool,
}

impl ManagerDelegation {
    /// Returns true if the delegation grants anything on `on`.
    #[must_use]
    pub fn is_in_force(&self, on: NaiveDate) -> bool {
        self.is_active && self.period.contains(on) && (self.can_approve || self.can_reject)
    }
}

/// A period during which leave may not be requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBlockPeriod {
    /// Identifier.
    pub id: BlockPeriodId,
    /// Display name ("Year-end close").
    pub name: String,
    /// Blocked dates.
    pub period: DateRange,
    /// Affected leave types; empty means all types.
    pub leave_type_ids: Vec<LeaveTypeId>,
    /// Affected departments; empty means the whole company.
    pub department_ids: Vec<DepartmentId>,
    /// Employees the block never applies to.
    pub exempt_employee_ids: Vec<EmployeeId>,
    /// Departments the block never applies to.
    pub exempt_department_ids: Vec<DepartmentId>,
    /// Emergency requests pass through.
    pub allow_emergency_requests: bool,
    /// Inactive blocks are ignored.
    pub is_active: bool,
}

impl LeaveBlockPeriod {
    /// Returns true if the block covers a request by `employee` of
    /// `leave_type_id` over `range`, exemptions considered.
    #[must_use]
    pub fn applies_to(
        &self,
        employee: &EmployeeProfile,
        leave_type_id: LeaveTypeId,
        range: &DateRange,
    ) -> bool {
        self.is_active
            && self.period.intersects(range)
            && (self.leave_type_ids.is_empty() || self.leave_type_ids.contains(&leave_type_id))
            && (self.department_ids.is_empty()
                || self.department_ids.contains(&employee.department_id))
            && !self.exempt_employee_ids.contains(&employee.id)
            && !self.exempt_department_ids.contains(&employee.department_id)
    }

    /// Returns true if the block vetoes the request.
    #[must_use]
    pub fn vetoes(
        &self,
        employee: &EmployeeProfile,
        leave_type_id: LeaveTypeId,
        range: &DateRange,
        is_emergency: bool,
    ) -> bool {
        self.applies_to(employee, leave_type_id, range)
            && !(self.allow_emergency_requests && is_emergency)
    }
}
