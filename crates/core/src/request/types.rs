//! Leave request records.
//!
//! The approval chain is an ordered arena of steps; the active step is the
//! first one still pending, derived on demand rather than stored.

use chrono::{DateTime, Utc};
use furlough_shared::types::{DateRange, EmployeeId, LeaveRequestId, LeaveTypeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::LeaveStatus;
use super::validation::ValidationResult;
use crate::balance::ExcessDaysHandling;
use crate::collab::SyncTarget;
use crate::policy::{ApprovalTier, ApproverRole};

/// Decision recorded on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// Awaiting a decision.
    Pending,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
}

/// Escalation settings copied from the workflow level when the chain is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Hours after activation before the step is overdue.
    pub hours: u32,
    /// Whether the scheduler acts on overdue steps.
    pub auto_escalate: bool,
    /// Role that takes over; `None` only flags the step.
    pub escalate_to: Option<ApproverRole>,
}

/// Authority a delegate holds on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationGrant {
    /// Manager the step was originally resolved to.
    pub delegator_id: EmployeeId,
    /// Delegate may approve.
    pub can_approve: bool,
    /// Delegate may reject.
    pub can_reject: bool,
}

/// One step of an approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Workflow level the step came from.
    pub level: u8,
    /// Role staffing the step.
    pub role: ApproverRole,
    /// Who owns the step now.
    pub approver_id: EmployeeId,
    /// Set when `approver_id` acts for a delegating manager.
    pub delegation: Option<DelegationGrant>,
    /// Required levels block advancement.
    pub is_required: bool,
    /// May override a prior rejection.
    pub can_override: bool,
    /// Escalation settings.
    pub escalation: EscalationRule,
    /// Decision.
    pub action: StepAction,
    /// Who decided (the approver, a delegate, or an overriding officer).
    pub acted_by: Option<EmployeeId>,
    /// Decision comments.
    pub comments: Option<String>,
    /// When the decision was made.
    pub action_date: Option<DateTime<Utc>>,
    /// When the step became active; `None` while earlier steps are pending.
    pub activated_at: Option<DateTime<Utc>>,
    /// Escalated during the current activation.
    pub is_escalated: bool,
    /// When it was escalated.
    pub escalated_at: Option<DateTime<Utc>>,
    /// Approver before a reassigning escalation.
    pub escalated_from: Option<EmployeeId>,
}

impl ApprovalStep {
    /// Returns true while awaiting a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.action == StepAction::Pending
    }

    /// Tier of the step's role.
    #[must_use]
    pub fn tier(&self) -> ApprovalTier {
        self.role.tier()
    }

    /// Returns true if `actor` may record `action` on this step.
    ///
    /// The owner may always decide; the original manager of a delegated
    /// step keeps authority too. A delegate is bounded by the grant.
    #[must_use]
    pub fn may_decide(&self, actor: EmployeeId, action: StepAction) -> bool {
        match self.delegation {
            Some(grant) if actor == self.approver_id => match action {
                StepAction::Approved => grant.can_approve,
                StepAction::Rejected => grant.can_reject,
                StepAction::Pending => false,
            },
            Some(grant) => actor == grant.delegator_id,
            None => actor == self.approver_id,
        }
    }

    /// Records a decision.
    pub fn decide(
        &mut self,
        action: StepAction,
        actor: EmployeeId,
        comments: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.action = action;
        self.acted_by = Some(actor);
        self.comments = comments;
        self.action_date = Some(at);
    }
}

/// Entry in a request's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Previous status.
    pub from: LeaveStatus,
    /// New status.
    pub to: LeaveStatus,
    /// When.
    pub at: DateTime<Utc>,
    /// Who caused it; `None` for scheduled transitions.
    pub by: Option<EmployeeId>,
}

/// Another booked request overlapping this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapDetail {
    /// Colliding request.
    pub request_id: LeaveRequestId,
    /// Its dates.
    pub range: DateRange,
    /// Its status when the overlap was detected.
    pub status: LeaveStatus,
}

/// Result of the team concurrency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConflictDetail {
    /// Team members on leave at the busiest day, requester included.
    pub concurrent: u32,
    /// Team size.
    pub team_size: u32,
    /// Allowed concurrency.
    pub allowed: u32,
    /// Requests counted against the threshold.
    pub colliding_request_ids: Vec<LeaveRequestId>,
}

/// Override of a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// The override was performed by an HR-tier level.
    pub is_hr_override: bool,
    /// Who overrode.
    pub overridden_by: EmployeeId,
    /// When.
    pub overridden_at: DateTime<Utc>,
    /// Justification.
    pub reason: String,
    /// Status that was overridden.
    pub overridden_status: LeaveStatus,
}

/// Cancellation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    /// Justification.
    pub reason: String,
    /// Who cancelled.
    pub cancelled_by: EmployeeId,
    /// When.
    pub cancelled_at: DateTime<Utc>,
}

/// Downstream sync acknowledgments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// When the approval signal was published.
    pub published_at: Option<DateTime<Utc>>,
    /// Payroll acknowledged.
    pub synced_to_payroll: bool,
    /// When payroll acknowledged.
    pub synced_to_payroll_at: Option<DateTime<Utc>>,
    /// Time management acknowledged.
    pub synced_to_time_management: bool,
    /// When time management acknowledged.
    pub synced_to_time_management_at: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Returns true if `target` has acknowledged.
    #[must_use]
    pub fn is_acknowledged(&self, target: SyncTarget) -> bool {
        match target {
            SyncTarget::Payroll => self.synced_to_payroll,
            SyncTarget::TimeManagement => self.synced_to_time_management,
        }
    }

    /// Returns true once both targets acknowledged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        SyncTarget::ALL.iter().all(|t| self.is_acknowledged(*t))
    }

    /// Records an acknowledgment; returns false if it was already recorded.
    pub fn acknowledge(&mut self, target: SyncTarget, at: DateTime<Utc>) -> bool {
        if self.is_acknowledged(target) {
            return false;
        }
        match target {
            SyncTarget::Payroll => {
                self.synced_to_payroll = true;
                self.synced_to_payroll_at = Some(at);
            }
            SyncTarget::TimeManagement => {
                self.synced_to_time_management = true;
                self.synced_to_time_management_at = Some(at);
            }
        }
        true
    }
}

/// Which notifications the request's workflow asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Tell the first approver on submission.
    pub on_submit: bool,
    /// Tell the next approver, and the requester on final approval.
    pub on_approval: bool,
    /// Tell the requester on rejection.
    pub on_rejection: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            on_submit: true,
            on_approval: true,
            on_rejection: true,
        }
    }
}

/// Input for creating a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeaveRequest {
    /// Requester.
    pub employee_id: EmployeeId,
    /// Leave type.
    pub leave_type_id: LeaveTypeId,
    /// Dates, inclusive.
    pub range: DateRange,
    /// Half a day; single-day ranges only.
    pub half_day: bool,
    /// Free-text reason.
    pub reason: String,
    /// Supporting documents held by the external document store.
    pub document_ids: Vec<String>,
    /// Emergency requests may pass block periods that allow it.
    pub is_emergency: bool,
    /// Retroactive request for leave already taken.
    pub is_post_leave: bool,
}

/// A leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Identifier.
    pub id: LeaveRequestId,
    /// Requester.
    pub employee_id: EmployeeId,
    /// Leave type.
    pub leave_type_id: LeaveTypeId,
    /// Dates, inclusive.
    pub range: DateRange,
    /// Half-day request.
    pub half_day: bool,
    /// Working days requested.
    pub total_days: Decimal,
    /// Free-text reason.
    pub reason: String,
    /// Supporting documents.
    pub document_ids: Vec<String>,
    /// Emergency flag.
    pub is_emergency: bool,
    /// Retroactive request.
    pub is_post_leave: bool,
    /// Current state.
    pub status: LeaveStatus,
    /// Every transition so far.
    pub status_history: Vec<StatusChange>,
    /// Ordered approval steps.
    pub approval_chain: Vec<ApprovalStep>,
    /// Notification flags of the workflow the chain was built from.
    pub notify: NotifySettings,
    /// Paid/unpaid split decided at reservation.
    pub excess: ExcessDaysHandling,
    /// Leave year the request is charged to.
    pub balance_year: i32,
    /// Advisory findings.
    pub validation: ValidationResult,
    /// Overlaps another booked request of the same employee.
    pub has_overlap: bool,
    /// The overlapping requests.
    pub overlap_details: Vec<OverlapDetail>,
    /// Team concurrency threshold exceeded.
    pub has_team_conflict: bool,
    /// Team concurrency details.
    pub conflict_details: Option<TeamConflictDetail>,
    /// Set when a rejection was overridden.
    pub override_record: Option<OverrideRecord>,
    /// Set when cancelled.
    pub cancellation: Option<CancellationRecord>,
    /// Downstream acknowledgments.
    pub sync: SyncState,
    /// Optimistic concurrency stamp; bumped by the store on every write.
    pub version: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Submission time.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Creates a draft from validated input.
    #[must_use]
    pub fn draft(input: NewLeaveRequest, total_days: Decimal, balance_year: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: LeaveRequestId::new(),
            employee_id: input.employee_id,
            leave_type_id: input.leave_type_id,
            range: input.range,
            half_day: input.half_day,
            total_days,
            reason: input.reason,
            document_ids: input.document_ids,
            is_emergency: input.is_emergency,
            is_post_leave: input.is_post_leave,
            status: LeaveStatus::Draft,
            status_history: Vec::new(),
            approval_chain: Vec::new(),
            notify: NotifySettings::default(),
            excess: ExcessDaysHandling::default(),
            balance_year,
            validation: ValidationResult::default(),
            has_overlap: false,
            overlap_details: Vec::new(),
            has_team_conflict: false,
            conflict_details: None,
            override_record: None,
            cancellation: None,
            sync: SyncState::default(),
            version: 0,
            created_at: now,
            submitted_at: None,
            updated_at: now,
        }
    }

    /// Index of the active step: the first pending one.
    #[must_use]
    pub fn active_step_index(&self) -> Option<usize> {
        if !self.status.is_pending() {
            return None;
        }
        self.approval_chain.iter().position(ApprovalStep::is_pending)
    }

    /// The active step.
    #[must_use]
    pub fn active_step(&self) -> Option<&ApprovalStep> {
        self.active_step_index()
            .and_then(|i| self.approval_chain.get(i))
    }

    /// Days reserved against the balance.
    #[must_use]
    pub fn paid_days(&self) -> Decimal {
        self.excess.paid_days
    }

    /// Final approval reached and not yet completed.
    #[must_use]
    pub fn is_fully_approved(&self) -> bool {
        matches!(self.status, LeaveStatus::HrApproved | LeaveStatus::ManagerApproved)
            && self.approval_chain.iter().all(|s| !s.is_pending())
    }

    /// Moves to `to` and appends the history entry.
    ///
    /// Callers check the transition table first.
    pub fn record_status(&mut self, to: LeaveStatus, at: DateTime<Utc>, by: Option<EmployeeId>) {
        self.status_history.push(StatusChange {
            from: self.status,
            to,
            at,
            by,
        });
        self.status = to;
        self.updated_at = at;
    }

    /// Adds an overlap reference unless already present.
    pub fn add_overlap(&mut self, detail: OverlapDetail) -> bool {
        if self.overlap_details.iter().any(|o| o.request_id == detail.request_id) {
            return false;
        }
        self.overlap_details.push(detail);
        self.has_overlap = true;
        true
    }
}
