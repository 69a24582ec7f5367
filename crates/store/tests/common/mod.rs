//! Shared harness for the store integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use furlough_core::ManualClock;
use furlough_core::balance::{AdjustmentInput, AdjustmentType, BalanceKey};
use furlough_core::collab::StaticHolidayCalendar;
use furlough_core::policy::{
    AccrualFrequency, AccrualRules, ApprovalLevel, ApprovalWorkflow, ApproverRole, CarryOverRules, EmployeeProfile,
    Eligibility, LeaveType, ResetCriterion, VacationPackage,
};
use furlough_core::request::{LeaveRequest, NewLeaveRequest};
use furlough_shared::config::AppConfig;
use furlough_shared::types::{
    ApprovalWorkflowId, DateRange, DepartmentId, EmployeeId, LeaveRequestId, LeaveTypeId, VacationPackageId,
};
use furlough_store::collab::{RecordingNotifier, RecordingSync, StaticOrgChart};
use furlough_store::{LeaveService, PolicyCatalog, WorkflowDeps};
use rust_decimal::Decimal;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn at(y: i32, m: u32, day: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, h, 0, 0).unwrap()
}

pub fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

pub struct People {
    pub requester: EmployeeId,
    pub colleagues: Vec<EmployeeId>,
    pub manager: EmployeeId,
    pub department_head: EmployeeId,
    pub hr_officer: EmployeeId,
    pub hr_manager: EmployeeId,
    pub department: DepartmentId,
}

pub struct Harness {
    pub service: LeaveService,
    pub catalog: Arc<PolicyCatalog>,
    pub clock: Arc<ManualClock>,
    pub org: Arc<StaticOrgChart>,
    pub notifier: Arc<RecordingNotifier>,
    pub sync: Arc<RecordingSync>,
    pub people: People,
    pub annual: LeaveType,
    pub unpaid: LeaveType,
}

pub fn profile(id: EmployeeId, department_id: DepartmentId) -> EmployeeProfile {
    EmployeeProfile {
        id,
        department_id,
        position: "Engineer".to_string(),
        grade: "G5".to_string(),
        contract_type: "permanent".to_string(),
        country_code: "DE".to_string(),
        hire_date: d(2020, 1, 1),
        work_start_date: None,
        is_suspended: false,
        on_unpaid_leave: false,
    }
}

pub fn leave_type(code: &str, is_paid: bool) -> LeaveType {
    LeaveType {
        id: LeaveTypeId::new(),
        code: code.to_string(),
        name: code.to_string(),
        is_paid,
        allow_unpaid_excess: true,
        max_days_per_request: None,
        max_days_per_year: None,
        document_required_after_days: None,
        carry_over_eligible: true,
        encashment_eligible: true,
        payroll_code: format!("PAY-{code}"),
        is_active: true,
    }
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

/// Manager (auto-escalates to the department head after 48h), HR officer,
/// optional HR manager with override authority.
pub fn default_workflow() -> ApprovalWorkflow {
    ApprovalWorkflow {
        id: ApprovalWorkflowId::new(),
        name: "Default".to_string(),
        leave_type_id: None,
        is_active: true,
        levels: vec![
            ApprovalLevel {
                escalation_hours: Some(48),
                auto_escalate_on_timeout: true,
                escalate_to: Some(ApproverRole::DepartmentHead),
                ..level(1, ApproverRole::DirectManager)
            },
            level(2, ApproverRole::HrOfficer),
            ApprovalLevel {
                is_required: false,
                can_override: true,
                ..level(3, ApproverRole::HrManager)
            },
        ],
        notify_on_submit: true,
        notify_on_approval: true,
        notify_on_rejection: true,
    }
}

pub fn monthly_package(leave_type_id: LeaveTypeId, rate: Decimal) -> VacationPackage {
    VacationPackage {
        id: VacationPackageId::new(),
        name: "Standard".to_string(),
        leave_type_id,
        priority: 10,
        is_active: true,
        eligibility: Eligibility::default(),
        accrual: AccrualRules {
            frequency: AccrualFrequency::Monthly,
            rate,
            pause_on_unpaid_leave: true,
            pause_on_suspension: true,
        },
        carry_over: CarryOverRules {
            max_days: Decimal::from(5),
            expiry_months: 3,
            allow_unlimited: false,
        },
        reset: ResetCriterion::CalendarYear,
    }
}

impl Harness {
    /// Four people in one department, default workflow, clock on
    /// Monday 2025-03-03 09:00.
    pub fn new() -> Self {
        let harness = Self::without_workflow();
        harness.catalog.add_workflow(default_workflow());
        harness
    }

    pub fn without_workflow() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let clock = Arc::new(ManualClock::new(at(2025, 3, 3, 9)));
        let catalog = Arc::new(PolicyCatalog::new());
        let org = Arc::new(StaticOrgChart::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let sync = Arc::new(RecordingSync::new());

        let department = DepartmentId::new();
        let people = People {
            requester: EmployeeId::new(),
            colleagues: (0..3).map(|_| EmployeeId::new()).collect(),
            manager: EmployeeId::new(),
            department_head: EmployeeId::new(),
            hr_officer: EmployeeId::new(),
            hr_manager: EmployeeId::new(),
            department,
        };
        for id in std::iter::once(people.requester).chain(people.colleagues.iter().copied()) {
            catalog.upsert_employee(profile(id, department));
            org.assign(id, ApproverRole::DirectManager, people.manager);
            org.assign(id, ApproverRole::DepartmentHead, people.department_head);
            org.assign(id, ApproverRole::HrOfficer, people.hr_officer);
            org.assign(id, ApproverRole::HrManager, people.hr_manager);
        }

        let annual = leave_type("ANNUAL", true);
        let unpaid = leave_type("UNPAID", false);
        catalog.upsert_leave_type(annual.clone());
        catalog.upsert_leave_type(unpaid.clone());

        let deps = WorkflowDeps {
            catalog: Arc::clone(&catalog),
            org: org.clone(),
            calendar: Arc::new(StaticHolidayCalendar::new()),
            notifier: notifier.clone(),
            sync: sync.clone(),
            clock: clock.clone(),
        };
        let service = LeaveService::new(config, deps);

        Self {
            service,
            catalog,
            clock,
            org,
            notifier,
            sync,
            people,
            annual,
            unpaid,
        }
    }

    pub fn key(&self, employee: EmployeeId) -> BalanceKey {
        BalanceKey::new(employee, self.annual.id, 2025)
    }

    /// Credits `days` of annual leave for 2025.
    pub fn credit(&self, employee: EmployeeId, days: Decimal) {
        let input = AdjustmentInput {
            adjustment_type: AdjustmentType::Manual,
            delta: days,
            reason: "Opening balance".to_string(),
            performed_by: Some(self.people.hr_officer),
        };
        self.service.adjust_balance(self.key(employee), &input).unwrap();
    }

    pub fn input(&self, employee: EmployeeId, leave_type: &LeaveType, start: NaiveDate, end: NaiveDate) -> NewLeaveRequest {
        NewLeaveRequest {
            employee_id: employee,
            leave_type_id: leave_type.id,
            range: range(start, end),
            half_day: false,
            reason: "Holiday".to_string(),
            document_ids: vec![],
            is_emergency: false,
            is_post_leave: false,
        }
    }

    /// Drafts and submits annual leave.
    pub fn submit_annual(&self, employee: EmployeeId, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        let draft = self
            .service
            .create_draft(self.input(employee, &self.annual, start, end))
            .unwrap()
            .value;
        self.service.submit(draft.id, employee).unwrap().value
    }

    pub fn today(&self) -> NaiveDate {
        furlough_core::Clock::now(self.clock.as_ref()).date_naive()
    }

    pub fn request(&self, id: LeaveRequestId) -> LeaveRequest {
        self.service.get_request(id).unwrap().value
    }
}
