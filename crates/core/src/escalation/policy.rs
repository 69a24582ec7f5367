//! Escalation policy for the active approval step.

use chrono::{DateTime, Duration, Utc};
use furlough_shared::types::EmployeeId;

use crate::collab::NotificationEvent;
use crate::policy::ApproverRole;
use crate::request::LeaveRequest;
use crate::workflow::{ChainResolver, LedgerEffect, ResolvedApprover, Transition, WorkflowError};

/// What the scheduler should do with a request's active step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationDecision {
    /// Request is not awaiting a decision.
    NoActiveStep,
    /// The step does not auto-escalate.
    NotConfigured,
    /// Already escalated during the current activation.
    AlreadyEscalated,
    /// Not overdue yet.
    NotDue {
        /// When the step becomes overdue.
        due_at: DateTime<Utc>,
    },
    /// Hand the step to another approver.
    Reassign {
        /// Active step index.
        step_index: usize,
        /// Current owner.
        from: EmployeeId,
        /// New owner.
        to: ResolvedApprover,
        /// Role that took over.
        role: ApproverRole,
    },
    /// Mark the step escalated without changing its owner.
    FlagOnly {
        /// Active step index.
        step_index: usize,
    },
}

impl EscalationDecision {
    /// Returns true if applying the decision changes the request.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Reassign { .. } | Self::FlagOnly { .. })
    }
}

/// Stateless service deciding and applying escalations.
pub struct EscalationPolicy;

impl EscalationPolicy {
    /// When the active step becomes overdue, if it has been activated.
    #[must_use]
    pub fn due_at(request: &LeaveRequest) -> Option<DateTime<Utc>> {
        let step = request.active_step()?;
        let activated = step.activated_at.or(request.submitted_at)?;
        Some(activated + Duration::hours(i64::from(step.escalation.hours)))
    }

    /// Evaluates the active step at `now`.
    ///
    /// The step is overdue once `now - activated_at >= hours`. A late tick
    /// still escalates; a second tick within the same activation does not.
    /// When the fallback role resolves to nobody, or to the current owner,
    /// the step is only flagged.
    pub fn evaluate(request: &LeaveRequest, now: DateTime<Utc>, resolver: ChainResolver<'_>) -> EscalationDecision {
        let Some(step_index) = request.active_step_index() else {
            return EscalationDecision::NoActiveStep;
        };
        let step = &request.approval_chain[step_index];
        if !step.escalation.auto_escalate {
            return EscalationDecision::NotConfigured;
        }
        if step.is_escalated {
            return EscalationDecision::AlreadyEscalated;
        }
        let Some(due_at) = Self::due_at(request) else {
            return EscalationDecision::NoActiveStep;
        };
        if now < due_at {
            return EscalationDecision::NotDue { due_at };
        }

        let target = step.escalation.escalate_to.and_then(|role| {
            resolver
                .resolve(request.employee_id, role, now.date_naive())
                .filter(|resolved| resolved.approver_id != step.approver_id)
                .map(|resolved| (role, resolved))
        });
        match target {
            Some((role, to)) => EscalationDecision::Reassign {
                step_index,
                from: step.approver_id,
                to,
                role,
            },
            None => EscalationDecision::FlagOnly { step_index },
        }
    }

    /// Applies an actionable decision.
    ///
    /// The request status and the step's activation time are left alone;
    /// only ownership and the escalation markers change. Non-actionable
    /// decisions return the request unchanged.
    pub fn apply(
        request: &LeaveRequest,
        decision: &EscalationDecision,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        let mut next = request.clone();
        let step_index = match decision {
            EscalationDecision::Reassign { step_index, .. } | EscalationDecision::FlagOnly { step_index } => {
                *step_index
            }
            _ => return Ok(Transition::new(next, LedgerEffect::None)),
        };
        if request.active_step_index() != Some(step_index) {
            return Err(WorkflowError::StepNotActive {
                index: step_index,
                active: request.active_step_index(),
            });
        }

        let step = &mut next.approval_chain[step_index];
        step.is_escalated = true;
        step.escalated_at = Some(now);
        let mut recipients = Vec::new();
        if let EscalationDecision::Reassign { from, to, .. } = decision {
            step.escalated_from = Some(*from);
            step.approver_id = to.approver_id;
            step.delegation = to.delegation;
            recipients.push(to.approver_id);
        }
        next.updated_at = now;

        let mut transition = Transition::new(next, LedgerEffect::None);
        transition.notify(true, NotificationEvent::Escalated, recipients);
        Ok(transition)
    }
}
