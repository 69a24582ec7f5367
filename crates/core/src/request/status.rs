//! Request status and transition table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::ApprovalTier;

/// State of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaveStatus {
    /// Created, not yet submitted.
    Draft,
    /// A line-management step is active.
    PendingManagerApproval,
    /// Line management approved: either a hop towards HR, or final
    /// approval of a workflow without HR levels.
    ManagerApproved,
    /// An HR step is active.
    #[serde(rename = "pendingHRApproval")]
    PendingHrApproval,
    /// Finally approved by HR.
    HrApproved,
    /// Rejected by HR.
    HrRejected,
    /// Rejected by line management.
    ManagerRejected,
    /// Withdrawn before a decision was final.
    Cancelled,
    /// Leave taken and acknowledged downstream.
    Completed,
}

impl LeaveStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Draft,
        Self::PendingManagerApproval,
        Self::ManagerApproved,
        Self::PendingHrApproval,
        Self::HrApproved,
        Self::HrRejected,
        Self::ManagerRejected,
        Self::Cancelled,
        Self::Completed,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingManagerApproval => "pendingManagerApproval",
            Self::ManagerApproved => "managerApproved",
            Self::PendingHrApproval => "pendingHRApproval",
            Self::HrApproved => "hrApproved",
            Self::HrRejected => "hrRejected",
            Self::ManagerRejected => "managerRejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Terminal states. Rejections can still be overridden.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ManagerRejected | Self::HrRejected | Self::Cancelled | Self::Completed
        )
    }

    /// States with an active approval step.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::PendingManagerApproval | Self::PendingHrApproval)
    }

    /// Rejected states.
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::ManagerRejected | Self::HrRejected)
    }

    /// States whose dates count as booked for overlap and team checks.
    #[must_use]
    pub const fn counts_as_booked(self) -> bool {
        matches!(
            self,
            Self::PendingManagerApproval
                | Self::ManagerApproved
                | Self::PendingHrApproval
                | Self::HrApproved
                | Self::Completed
        )
    }

    /// Pending status for a step of `tier`.
    #[must_use]
    pub const fn pending_for(tier: ApprovalTier) -> Self {
        match tier {
            ApprovalTier::LineManagement => Self::PendingManagerApproval,
            ApprovalTier::Hr => Self::PendingHrApproval,
        }
    }

    /// Rejected status for a step of `tier`.
    #[must_use]
    pub const fn rejected_by(tier: ApprovalTier) -> Self {
        match tier {
            ApprovalTier::LineManagement => Self::ManagerRejected,
            ApprovalTier::Hr => Self::HrRejected,
        }
    }

    /// Final approved status for a chain whose last step is of `tier`.
    #[must_use]
    pub const fn approved_by(tier: ApprovalTier) -> Self {
        match tier {
            ApprovalTier::LineManagement => Self::ManagerApproved,
            ApprovalTier::Hr => Self::HrApproved,
        }
    }

    /// Transition table.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        use LeaveStatus::{
            Cancelled, Completed, Draft, HrApproved, HrRejected, ManagerApproved, ManagerRejected,
            PendingHrApproval, PendingManagerApproval,
        };
        matches!(
            (self, to),
            (Draft, PendingManagerApproval | PendingHrApproval)
                | (
                    PendingManagerApproval,
                    ManagerApproved | ManagerRejected | Cancelled
                )
                | (ManagerApproved, PendingHrApproval | Completed)
                | (PendingHrApproval, HrApproved | HrRejected | Cancelled)
                | (HrApproved, Completed)
                | (
                    ManagerRejected,
                    PendingManagerApproval | ManagerApproved | PendingHrApproval | HrApproved
                )
                | (HrRejected, PendingHrApproval | HrApproved)
        )
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
