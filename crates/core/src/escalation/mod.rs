//! Timed escalation of overdue approval steps.
//!
//! This module implements:
//! - Due-time computation from the step's activation time
//! - Reassignment to the configured fallback role, or flagging when none
//! - Idempotence per activation

pub mod policy;

#[cfg(test)]
mod policy_props;

pub use policy::{EscalationDecision, EscalationPolicy};
