//! Balance ledger.
//!
//! This module implements the per-employee, per-type, per-year accounting
//! record and everything that mutates it:
//! - Balance records and their conservation invariant
//! - Excess-day split into paid and unpaid portions
//! - Reserve / commit / release / adjust arithmetic
//! - Audit rows for every non-reservation mutation
//! - Accrual, rollover and carryover expiry planning

pub mod accrual;
pub mod adjustment;
pub mod error;
pub mod excess;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod accrual_props;
#[cfg(test)]
mod ledger_props;

pub use accrual::{AccrualPlan, AccrualService, RolloverPlan};
pub use adjustment::{AdjustmentBucket, AdjustmentInput, AdjustmentType, LeaveAdjustment};
pub use error::LedgerError;
pub use excess::ExcessDaysHandling;
pub use ledger::{LedgerService, Reservation};
pub use types::{BalanceKey, BalanceSnapshot, EmployeeLeaveBalance};
