//! Core leave-lifecycle logic for Furlough.
//!
//! This crate contains pure business logic with ZERO storage or transport
//! dependencies. All domain types, ledger arithmetic, validation rules and
//! state transitions live here; the `furlough-store` crate persists the
//! results and drives the periodic tasks.
//!
//! # Modules
//!
//! - `balance` - Balance ledger arithmetic, excess-day split, accrual and carryover
//! - `conflict` - Overlap, team-conflict and block-period checks
//! - `escalation` - Timed escalation of overdue approval steps
//! - `policy` - Leave types, vacation packages, approval workflows and modifiers
//! - `request` - Leave request data model, status machine states, validation findings
//! - `workflow` - Approval chain building and the request state machine
//! - `collab` - Interfaces of external collaborators
//! - `clock` - Wall-clock abstraction

pub mod balance;
pub mod clock;
pub mod collab;
pub mod conflict;
pub mod error;
pub mod escalation;
pub mod policy;
pub mod request;
pub mod workflow;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ErrorKind;
