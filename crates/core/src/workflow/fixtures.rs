//! Shared fixtures for workflow and escalation tests.

use chrono::{DateTime, NaiveDate, Utc};
use furlough_shared::types::{ApprovalWorkflowId, DateRange, EmployeeId, LeaveTypeId};
use rust_decimal::Decimal;

use super::chain::test_support::{FixedDelegations, FixedOrg};
use super::chain::{ApprovalChainBuilder, ChainResolver};
use super::machine::LeaveStateMachine;
use crate::balance::ExcessDaysHandling;
use crate::conflict::ConflictReport;
use crate::policy::{ApprovalLevel, ApprovalWorkflow, ApproverRole};
use crate::request::{LeaveRequest, NewLeaveRequest};

/// Everyone involved in a request.
#[derive(Debug, Clone, Copy)]
pub struct Actors {
    pub requester: EmployeeId,
    pub manager: EmployeeId,
    pub department_head: EmployeeId,
    pub hr_officer: EmployeeId,
    pub hr_manager: EmployeeId,
}

impl Actors {
    pub fn new() -> Self {
        Self {
            requester: EmployeeId::new(),
            manager: EmployeeId::new(),
            department_head: EmployeeId::new(),
            hr_officer: EmployeeId::new(),
            hr_manager: EmployeeId::new(),
        }
    }

    pub fn org(&self) -> FixedOrg {
        FixedOrg::default()
            .with(self.requester, ApproverRole::DirectManager, self.manager)
            .with(self.requester, ApproverRole::DepartmentHead, self.department_head)
            .with(self.requester, ApproverRole::HrOfficer, self.hr_officer)
            .with(self.requester, ApproverRole::HrManager, self.hr_manager)
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn level(level: u8, role: ApproverRole) -> ApprovalLevel {
    ApprovalLevel {
        level,
        role,
        is_required: true,
        can_override: false,
        escalation_hours: None,
        auto_escalate_on_timeout: false,
        escalate_to: None,
    }
}

/// Manager (escalates to department head after 48h), HR officer, HR
/// manager with override authority.
pub fn three_level_workflow() -> ApprovalWorkflow {
    let manager = ApprovalLevel {
        escalation_hours: Some(48),
        auto_escalate_on_timeout: true,
        escalate_to: Some(ApproverRole::DepartmentHead),
        ..level(1, ApproverRole::DirectManager)
    };
    let hr_manager = ApprovalLevel {
        is_required: false,
        can_override: true,
        ..level(3, ApproverRole::HrManager)
    };
    workflow(vec![manager, level(2, ApproverRole::HrOfficer), hr_manager])
}

pub fn workflow(levels: Vec<ApprovalLevel>) -> ApprovalWorkflow {
    ApprovalWorkflow {
        id: ApprovalWorkflowId::new(),
        name: "Default".to_string(),
        leave_type_id: None,
        is_active: true,
        levels,
        notify_on_submit: true,
        notify_on_approval: true,
        notify_on_rejection: true,
    }
}

pub fn draft(actors: &Actors, now: DateTime<Utc>) -> LeaveRequest {
    LeaveRequest::draft(
        NewLeaveRequest {
            employee_id: actors.requester,
            leave_type_id: LeaveTypeId::new(),
            range: DateRange::new(d(2025, 12, 1), d(2025, 12, 5)).unwrap(),
            half_day: false,
            reason: "Family trip".to_string(),
            document_ids: vec![],
            is_emergency: false,
            is_post_leave: false,
        },
        Decimal::from(5),
        2025,
        now,
    )
}

/// A request submitted against `workflow` at `now`.
pub fn submitted(actors: &Actors, workflow: &ApprovalWorkflow, now: DateTime<Utc>) -> LeaveRequest {
    let org = actors.org();
    let delegations = FixedDelegations::default();
    let resolver = ChainResolver {
        org: &org,
        delegations: &delegations,
        default_escalation_hours: 48,
    };
    let request = draft(actors, now);
    let chain =
        ApprovalChainBuilder::build_from(workflow, actors.requester, now.date_naive(), now, resolver)
            .unwrap();
    LeaveStateMachine::submit(
        &request,
        chain,
        ExcessDaysHandling::all_paid(request.total_days),
        &ConflictReport::default(),
        actors.requester,
        now,
    )
    .unwrap()
    .request
}
