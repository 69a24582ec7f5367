//! Leave requests.
//!
//! - Request status and its transition table
//! - Request, approval step and bookkeeping records
//! - Blocking validation failures and non-blocking warnings

pub mod status;
pub mod types;
pub mod validation;

pub use status::LeaveStatus;
pub use types::{
    ApprovalStep, CancellationRecord, DelegationGrant, EscalationRule, LeaveRequest,
    NewLeaveRequest, NotifySettings, OverlapDetail, OverrideRecord, StatusChange, StepAction, SyncState,
    TeamConflictDetail,
};
pub use validation::{RequestValidator, ValidationFailure, ValidationResult, ValidationWarning};
