//! Approval workflow engine.
//!
//! This module implements the leave request lifecycle:
//! - Approval chain construction from workflow configuration
//! - Role-to-approver resolution honoring delegations
//! - The request state machine (submit, decide, cancel, override,
//!   sync acknowledgment, completion)
//! - Error types for workflow operations

pub mod chain;
pub mod error;
pub mod machine;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod machine_props;

pub use chain::{ApprovalChain, ApprovalChainBuilder, ChainResolver, ResolvedApprover, resolve_approver};
pub use error::WorkflowError;
pub use machine::LeaveStateMachine;
pub use types::{Decision, LedgerEffect, Notification, Transition};
