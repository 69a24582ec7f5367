//! The leave request state machine.
//!
//! Every operation takes the current request by reference and returns a
//! `Transition` holding the next request, the ledger work the caller must
//! perform and the notifications to send. Nothing is mutated on error.

use chrono::{DateTime, NaiveDate, Utc};
use furlough_shared::types::EmployeeId;

use super::error::WorkflowError;
use super::types::{Decision, LedgerEffect, Transition};
use crate::balance::ExcessDaysHandling;
use crate::collab::{NotificationEvent, SyncTarget};
use crate::conflict::ConflictReport;
use crate::request::{
    ApprovalStep, CancellationRecord, LeaveRequest, LeaveStatus, OverrideRecord, StepAction, ValidationFailure,
    ValidationWarning,
};
use crate::workflow::chain::ApprovalChain;

/// Stateless service for leave request transitions.
pub struct LeaveStateMachine;

impl LeaveStateMachine {
    /// Submits a draft.
    ///
    /// The caller has already reserved the paid days (`excess`) and run
    /// the conflict checks (`report`). The chain's first step becomes
    /// active.
    pub fn submit(
        request: &LeaveRequest,
        chain: ApprovalChain,
        excess: ExcessDaysHandling,
        report: &ConflictReport,
        actor: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        let first = chain.steps.first().ok_or(WorkflowError::EmptyApprovalChain)?;
        let target = LeaveStatus::pending_for(first.tier());
        Self::ensure_transition(request.status, target)?;
        let first_approver = first.approver_id;

        let mut next = request.clone();
        next.approval_chain = chain.steps;
        next.notify = chain.notify;
        next.excess = excess;
        if excess.converted_to_unpaid {
            next.validation.push(ValidationWarning::ExcessConvertedToUnpaid {
                paid_days: excess.paid_days,
                unpaid_days: excess.unpaid_days,
            });
        }
        report.apply_to(&mut next);
        next.submitted_at = Some(now);
        next.record_status(target, now, Some(actor));

        let on_submit = next.notify.on_submit;
        let mut transition = Transition::new(next, LedgerEffect::None);
        transition.notify(on_submit, NotificationEvent::Submitted, vec![first_approver]);
        Ok(transition)
    }

    /// Records a decision on the active step.
    ///
    /// Only the active step accepts a decision, and only once. Approval of
    /// the last step commits the reservation; rejection releases it.
    pub fn decide(
        request: &LeaveRequest,
        step_index: usize,
        decision: Decision,
        actor: EmployeeId,
        comments: Option<String>,
        require_rejection_comment: bool,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if !request.status.is_pending() {
            return Err(WorkflowError::RequestClosed(request.status));
        }
        let step = request
            .approval_chain
            .get(step_index)
            .ok_or(WorkflowError::StepNotFound(step_index))?;
        if !step.is_pending() {
            return Err(WorkflowError::StepAlreadyDecided(step_index));
        }
        let active = request.active_step_index();
        if active != Some(step_index) {
            return Err(WorkflowError::StepNotActive {
                index: step_index,
                active,
            });
        }
        let action = decision.action();
        if !step.may_decide(actor, action) {
            return Err(WorkflowError::NotAuthorized(actor));
        }
        let comments = comments.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        if decision == Decision::Reject && require_rejection_comment && comments.is_none() {
            return Err(ValidationFailure::RejectionCommentRequired.into());
        }

        let tier = step.tier();
        let mut next = request.clone();
        next.approval_chain[step_index].decide(action, actor, comments, now);

        match decision {
            Decision::Reject => {
                let target = LeaveStatus::rejected_by(tier);
                Self::ensure_transition(next.status, target)?;
                next.record_status(target, now, Some(actor));
                let notify = next.notify.on_rejection;
                let requester = next.employee_id;
                let mut transition = Transition::new(next, LedgerEffect::Release);
                transition.notify(notify, NotificationEvent::Rejected, vec![requester]);
                Ok(transition)
            }
            Decision::Approve => Self::advance(next, Some(actor), now, LedgerEffect::None),
        }
    }

    /// Cancels an open request and releases its reservation.
    ///
    /// Cancelling a terminal request is an error, never a second release.
    pub fn cancel(
        request: &LeaveRequest,
        actor: EmployeeId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if request.status.is_terminal() {
            return Err(WorkflowError::AlreadyTerminal(request.status));
        }
        Self::ensure_transition(request.status, LeaveStatus::Cancelled)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationFailure::CancellationReasonRequired.into());
        }
        let involved = actor == request.employee_id
            || request.approval_chain.iter().any(|s| {
                s.approver_id == actor || s.delegation.is_some_and(|g| g.delegator_id == actor)
            });
        if !involved {
            return Err(WorkflowError::NotAuthorized(actor));
        }

        let active_approver = request.active_step().map(|s| s.approver_id);
        let mut next = request.clone();
        next.cancellation = Some(CancellationRecord {
            reason: reason.to_string(),
            cancelled_by: actor,
            cancelled_at: now,
        });
        next.record_status(LeaveStatus::Cancelled, now, Some(actor));

        let mut transition = Transition::new(next, LedgerEffect::Release);
        let recipients: Vec<_> = active_approver.into_iter().filter(|a| *a != actor).collect();
        transition.notify(true, NotificationEvent::Cancelled, recipients);
        Ok(transition)
    }

    /// Overrides a rejection.
    ///
    /// The actor must own a `can_override` step. Every step up to the later
    /// of the rejected step and the overriding step is marked approved, and
    /// the flow resumes from there. The reservation was released on
    /// rejection, so the caller reserves again.
    pub fn override_rejection(
        request: &LeaveRequest,
        actor: EmployeeId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if !request.status.is_rejected() {
            return Err(WorkflowError::NotOverridable(request.status));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationFailure::OverrideReasonRequired.into());
        }
        let override_index = request
            .approval_chain
            .iter()
            .position(|s| s.can_override && s.may_decide(actor, StepAction::Approved))
            .ok_or(WorkflowError::NoOverrideAuthority(actor))?;
        let rejected_index = request
            .approval_chain
            .iter()
            .position(|s| s.action == StepAction::Rejected)
            .unwrap_or(override_index);
        let resume_after = rejected_index.max(override_index);

        let mut next = request.clone();
        for step in next.approval_chain.iter_mut().take(resume_after + 1) {
            if step.action != StepAction::Approved {
                step.decide(StepAction::Approved, actor, Some(reason.to_string()), now);
            }
        }
        next.override_record = Some(OverrideRecord {
            is_hr_override: request.approval_chain[override_index].role.is_hr(),
            overridden_by: actor,
            overridden_at: now,
            reason: reason.to_string(),
            overridden_status: request.status,
        });

        let mut transition = Self::advance(next, Some(actor), now, LedgerEffect::Reserve)?;
        let requester = transition.request.employee_id;
        transition.notify(true, NotificationEvent::Overridden, vec![requester]);
        Ok(transition)
    }

    /// Records a downstream acknowledgment. Repeated acknowledgments are no-ops.
    pub fn acknowledge_sync(
        request: &LeaveRequest,
        target: SyncTarget,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if !(request.is_fully_approved() || request.status == LeaveStatus::Completed) {
            return Err(WorkflowError::NotApproved(request.status));
        }
        let mut next = request.clone();
        if next.sync.acknowledge(target, now) {
            next.updated_at = now;
        }
        Ok(Transition::new(next, LedgerEffect::None))
    }

    /// Moves a fully approved request to `completed` once its dates have
    /// passed and both downstream targets acknowledged.
    pub fn complete(
        request: &LeaveRequest,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if !request.is_fully_approved() {
            return Err(WorkflowError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Completed,
            });
        }
        if request.range.end >= today {
            return Err(WorkflowError::NotYetCompletable("leave period has not elapsed"));
        }
        if !request.sync.is_complete() {
            return Err(WorkflowError::NotYetCompletable(
                "downstream sync not acknowledged",
            ));
        }
        let mut next = request.clone();
        next.record_status(LeaveStatus::Completed, now, None);
        Ok(Transition::new(next, LedgerEffect::None))
    }

    /// Activates the next pending step, or finishes the chain.
    ///
    /// Crossing from line management into HR records the `managerApproved`
    /// hop before `pendingHRApproval`.
    fn advance(
        mut next: LeaveRequest,
        actor: Option<EmployeeId>,
        now: DateTime<Utc>,
        base_effect: LedgerEffect,
    ) -> Result<Transition, WorkflowError> {
        let pending = next.approval_chain.iter().position(|s| s.is_pending());

        let Some(index) = pending else {
            let last_tier = next
                .approval_chain
                .last()
                .map(ApprovalStep::tier)
                .ok_or(WorkflowError::EmptyApprovalChain)?;
            let target = LeaveStatus::approved_by(last_tier);
            if next.status != target {
                Self::ensure_transition(next.status, target)?;
                next.record_status(target, now, actor);
            }
            let effect = if base_effect.reserves() {
                LedgerEffect::ReserveAndCommit
            } else {
                LedgerEffect::Commit
            };
            let notify = next.notify.on_approval;
            let requester = next.employee_id;
            let mut transition = Transition::new(next, effect);
            transition.notify(notify, NotificationEvent::Approved, vec![requester]);
            return Ok(transition);
        };

        let step = &mut next.approval_chain[index];
        step.activated_at = Some(now);
        step.is_escalated = false;
        step.escalated_at = None;
        let next_approver = step.approver_id;
        let target = LeaveStatus::pending_for(step.tier());

        if next.status != target {
            if next.status == LeaveStatus::PendingManagerApproval
                && target == LeaveStatus::PendingHrApproval
            {
                next.record_status(LeaveStatus::ManagerApproved, now, actor);
            }
            Self::ensure_transition(next.status, target)?;
            next.record_status(target, now, actor);
        }

        let notify = next.notify.on_approval;
        let mut transition = Transition::new(next, base_effect);
        transition.notify(notify, NotificationEvent::StepApproved, vec![next_approver]);
        Ok(transition)
    }

    fn ensure_transition(from: LeaveStatus, to: LeaveStatus) -> Result<(), WorkflowError> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition { from, to })
        }
    }
}
