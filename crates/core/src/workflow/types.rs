//! Types produced by the request state machine.

use furlough_shared::types::EmployeeId;
use serde::{Deserialize, Serialize};

use crate::collab::NotificationEvent;
use crate::request::{LeaveRequest, StepAction};

/// Decision an approver records on the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the step.
    Approve,
    /// Reject the step.
    Reject,
}

impl Decision {
    /// Step action recorded for the decision.
    #[must_use]
    pub const fn action(self) -> StepAction {
        match self {
            Self::Approve => StepAction::Approved,
            Self::Reject => StepAction::Rejected,
        }
    }
}

/// What the caller must do to the balance after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Nothing.
    None,
    /// Reserve the request's days again (override of a rejection).
    Reserve,
    /// Settle the reservation into `taken`.
    Commit,
    /// Drop the reservation.
    Release,
    /// Reserve and settle at once (override straight to final approval).
    ReserveAndCommit,
}

impl LedgerEffect {
    /// Returns true if the effect needs a fresh reservation.
    #[must_use]
    pub const fn reserves(self) -> bool {
        matches!(self, Self::Reserve | Self::ReserveAndCommit)
    }

    /// Returns true if the effect ends in final approval.
    #[must_use]
    pub const fn commits(self) -> bool {
        matches!(self, Self::Commit | Self::ReserveAndCommit)
    }
}

/// A notification to deliver after the transition is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Event.
    pub event: NotificationEvent,
    /// Recipients.
    pub recipients: Vec<EmployeeId>,
}

/// Outcome of a state-machine call.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The request after the transition.
    pub request: LeaveRequest,
    /// Ledger work the caller must perform.
    pub effect: LedgerEffect,
    /// Notifications to send once persisted.
    pub notifications: Vec<Notification>,
}

impl Transition {
    pub(crate) fn new(request: LeaveRequest, effect: LedgerEffect) -> Self {
        Self {
            request,
            effect,
            notifications: Vec::new(),
        }
    }

    pub(crate) fn notify(&mut self, enabled: bool, event: NotificationEvent, recipients: Vec<EmployeeId>) {
        if enabled && !recipients.is_empty() {
            self.notifications.push(Notification { event, recipients });
        }
    }
}
