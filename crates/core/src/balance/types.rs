//! Balance records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use furlough_shared::types::{EmployeeId, LeaveTypeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Unique key of a balance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    /// Employee.
    pub employee_id: EmployeeId,
    /// Leave type.
    pub leave_type_id: LeaveTypeId,
    /// Calendar year in which the leave year started.
    pub year: i32,
}

impl BalanceKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(employee_id: EmployeeId, leave_type_id: LeaveTypeId, year: i32) -> Self {
        Self {
            employee_id,
            leave_type_id,
            year,
        }
    }

    /// The same employee and type, one leave year later.
    #[must_use]
    pub const fn next_year(self) -> Self {
        Self::new(self.employee_id, self.leave_type_id, self.year + 1)
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.employee_id, self.leave_type_id, self.year)
    }
}

/// Point-in-time copy of the ledger buckets, used in audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Days credited by accrual.
    pub accrued: Decimal,
    /// Days carried from the prior leave year.
    pub carried_over: Decimal,
    /// Net manual, correction and encashment adjustments.
    pub manual_adjustments: Decimal,
    /// Days consumed by approved leave.
    pub taken: Decimal,
    /// Days reserved by open requests.
    pub pending: Decimal,
    /// Derived remaining days.
    pub remaining: Decimal,
}

/// The accounting record for one `BalanceKey`.
///
/// `remaining` is recomputed after every mutation:
/// `remaining == accrued + carried_over + manual_adjustments - taken - pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeLeaveBalance {
    /// Record key.
    pub key: BalanceKey,
    /// Days credited by accrual.
    pub accrued: Decimal,
    /// Days carried from the prior leave year.
    pub carried_over: Decimal,
    /// Net manual adjustments (may be negative).
    pub manual_adjustments: Decimal,
    /// Days consumed by approved leave.
    pub taken: Decimal,
    /// Reservation counter for open requests.
    pub pending: Decimal,
    remaining: Decimal,
    /// Optimistic concurrency stamp; bumped by the store on every write.
    pub version: u64,
    /// Start of the last accrual period credited (or skipped while paused).
    pub last_accrual_period: Option<NaiveDate>,
    /// When unconsumed carryover expires.
    pub carry_over_expires_on: Option<NaiveDate>,
    /// Carryover expiry already processed.
    pub carry_over_expired: bool,
    /// Year this record was rolled over into.
    pub rolled_over_into: Option<i32>,
    /// Year whose carryover has been credited here.
    #[serde(default)]
    pub carried_from: Option<i32>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl EmployeeLeaveBalance {
    /// Creates an empty record.
    #[must_use]
    pub fn new(key: BalanceKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            accrued: Decimal::ZERO,
            carried_over: Decimal::ZERO,
            manual_adjustments: Decimal::ZERO,
            taken: Decimal::ZERO,
            pending: Decimal::ZERO,
            remaining: Decimal::ZERO,
            version: 0,
            last_accrual_period: None,
            carry_over_expires_on: None,
            carry_over_expired: false,
            rolled_over_into: None,
            carried_from: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived remaining days.
    #[must_use]
    pub const fn remaining(&self) -> Decimal {
        self.remaining
    }

    /// Recomputes `remaining` from the buckets.
    pub fn recompute(&mut self) {
        self.remaining =
            self.accrued + self.carried_over + self.manual_adjustments - self.taken - self.pending;
    }

    /// Copies the buckets.
    #[must_use]
    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            accrued: self.accrued,
            carried_over: self.carried_over,
            manual_adjustments: self.manual_adjustments,
            taken: self.taken,
            pending: self.pending,
            remaining: self.remaining,
        }
    }

    /// Checks the ledger equation and bucket signs.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        for (bucket, value) in [
            ("accrued", self.accrued),
            ("carried_over", self.carried_over),
            ("taken", self.taken),
            ("pending", self.pending),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(LedgerError::NegativeBucket { bucket, value });
            }
        }
        let expected =
            self.accrued + self.carried_over + self.manual_adjustments - self.taken - self.pending;
        if expected != self.remaining {
            return Err(LedgerError::InvariantViolation(format!(
                "remaining {} does not match buckets ({expected}) for {}",
                self.remaining, self.key
            )));
        }
        Ok(())
    }
}
