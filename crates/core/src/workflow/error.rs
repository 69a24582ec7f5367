//! Workflow error types for the leave request lifecycle.
//!
//! This module defines all errors that can occur while building approval
//! chains and driving a request through its states.

use furlough_shared::AppError;
use furlough_shared::types::{EmployeeId, LeaveRequestId, LeaveTypeId};
use thiserror::Error;

use crate::balance::LedgerError;
use crate::error::ErrorKind;
use crate::policy::ApproverRole;
use crate::request::{LeaveStatus, ValidationFailure};

/// Errors that can occur during workflow operations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    // ========== Validation Errors ==========
    /// Blocking validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Ledger refused the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    // ========== State Errors ==========
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: LeaveStatus,
        /// The attempted target status.
        to: LeaveStatus,
    },

    /// Decision on a request without an active step.
    #[error("Request is {0}; no step awaits a decision")]
    RequestClosed(LeaveStatus),

    /// The step index does not exist.
    #[error("Approval step {0} not found")]
    StepNotFound(usize),

    /// The step was already decided.
    #[error("Approval step {0} was already decided")]
    StepAlreadyDecided(usize),

    /// The step is not the active one.
    #[error("Approval step {index} is not active (active step: {active:?})")]
    StepNotActive {
        /// Step the caller targeted.
        index: usize,
        /// The active step.
        active: Option<usize>,
    },

    /// Cancelling a request that already reached a terminal state.
    #[error("Request is already {0}")]
    AlreadyTerminal(LeaveStatus),

    /// Override of a request that is not rejected.
    #[error("Only rejected requests can be overridden, request is {0}")]
    NotOverridable(LeaveStatus),

    /// Completion preconditions are not met yet.
    #[error("Request cannot be completed yet: {0}")]
    NotYetCompletable(&'static str),

    /// Sync acknowledgment for a request that is not approved.
    #[error("Request is {0}; only approved requests are synced")]
    NotApproved(LeaveStatus),

    // ========== Authorization Errors ==========
    /// The actor may not decide this step.
    #[error("Employee {0} is not authorized to decide this step")]
    NotAuthorized(EmployeeId),

    /// The actor holds no overriding level on this chain.
    #[error("Employee {0} holds no override authority on this request")]
    NoOverrideAuthority(EmployeeId),

    // ========== Configuration Errors ==========
    /// Neither a type-specific nor a default workflow is active.
    #[error("No approval workflow applies to leave type {0}")]
    NoApplicableWorkflow(LeaveTypeId),

    /// A required level's role resolves to nobody.
    #[error("No approver holds role {role} for required level {level}")]
    ApproverUnresolved {
        /// Workflow level.
        level: u8,
        /// Role.
        role: ApproverRole,
    },

    /// Every level was optional and unresolvable.
    #[error("Approval chain is empty")]
    EmptyApprovalChain,

    /// HR levels must follow line-management levels.
    #[error("Workflow level {0} puts line management after HR")]
    InvalidLevelOrder(u8),

    // ========== Lookup Errors ==========
    /// Request not found.
    #[error("Leave request {0} not found")]
    RequestNotFound(LeaveRequestId),

    /// Leave type not found.
    #[error("Leave type {0} not found")]
    LeaveTypeNotFound(LeaveTypeId),

    /// Employee not found.
    #[error("Employee {0} not found")]
    EmployeeNotFound(EmployeeId),

    // ========== Persistence Errors ==========
    /// Lost the compare-and-swap race more often than allowed.
    #[error("Leave request {0} was modified concurrently")]
    ConcurrentModification(LeaveRequestId),

    /// Storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Category of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Ledger(err) => err.kind(),
            Self::InvalidTransition { .. }
            | Self::RequestClosed(_)
            | Self::StepAlreadyDecided(_)
            | Self::StepNotActive { .. }
            | Self::AlreadyTerminal(_)
            | Self::NotOverridable(_)
            | Self::NotYetCompletable(_)
            | Self::NotApproved(_)
            | Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::NotAuthorized(_) | Self::NoOverrideAuthority(_) => ErrorKind::Forbidden,
            Self::NoApplicableWorkflow(_)
            | Self::ApproverUnresolved { .. }
            | Self::EmptyApprovalChain
            | Self::InvalidLevelOrder(_) => ErrorKind::Configuration,
            Self::StepNotFound(_)
            | Self::RequestNotFound(_)
            | Self::LeaveTypeNotFound(_)
            | Self::EmployeeNotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Configuration => 422,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(failure) => failure.error_code(),
            Self::Ledger(err) => err.error_code(),
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RequestClosed(_) => "REQUEST_CLOSED",
            Self::StepNotFound(_) => "STEP_NOT_FOUND",
            Self::StepAlreadyDecided(_) => "STEP_ALREADY_DECIDED",
            Self::StepNotActive { .. } => "STEP_NOT_ACTIVE",
            Self::AlreadyTerminal(_) => "ALREADY_TERMINAL",
            Self::NotOverridable(_) => "NOT_OVERRIDABLE",
            Self::NotYetCompletable(_) => "NOT_YET_COMPLETABLE",
            Self::NotApproved(_) => "NOT_APPROVED",
            Self::NotAuthorized(_) => "NOT_AUTHORIZED_TO_DECIDE",
            Self::NoOverrideAuthority(_) => "NO_OVERRIDE_AUTHORITY",
            Self::NoApplicableWorkflow(_) => "NO_APPLICABLE_WORKFLOW",
            Self::ApproverUnresolved { .. } => "APPROVER_UNRESOLVED",
            Self::EmptyApprovalChain => "EMPTY_APPROVAL_CHAIN",
            Self::InvalidLevelOrder(_) => "INVALID_LEVEL_ORDER",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::LeaveTypeNotFound(_) => "LEAVE_TYPE_NOT_FOUND",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Storage(message) | WorkflowError::Ledger(LedgerError::Storage(message)) => {
                Self::Storage(message)
            }
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            from: LeaveStatus::Draft,
            to: LeaveStatus::Completed,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("draft"));
        assert!(err.to_string().contains("completed"));
    }

    #[test]
    fn test_step_not_active_error() {
        let err = WorkflowError::StepNotActive {
            index: 2,
            active: Some(0),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.error_code(), "STEP_NOT_ACTIVE");
    }

    #[test]
    fn test_not_authorized_error() {
        let err = WorkflowError::NotAuthorized(EmployeeId::new());
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_AUTHORIZED_TO_DECIDE");
    }

    #[test]
    fn test_configuration_errors() {
        let err = WorkflowError::ApproverUnresolved {
            level: 2,
            role: ApproverRole::DepartmentHead,
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.status_code(), 422);
        assert!(err.to_string().contains("department_head"));
    }

    #[test]
    fn test_validation_passthrough() {
        let err: WorkflowError = ValidationFailure::RejectionCommentRequired.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "REJECTION_COMMENT_REQUIRED");
    }

    #[test]
    fn test_ledger_passthrough() {
        let err: WorkflowError = LedgerError::InsufficientBalance {
            requested: dec!(5),
            remaining: dec!(1),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = WorkflowError::RequestNotFound(LeaveRequestId::new()).into();
        assert!(matches!(app, AppError::NotFound(_)));
        let app: AppError = WorkflowError::Storage("disk".to_string()).into();
        assert!(matches!(app, AppError::Storage(_)));
    }
}
