//! Excess-day conversion to unpaid leave.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// How a request's days split between the balance and unpaid leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExcessDaysHandling {
    /// Days charged to the balance.
    pub paid_days: Decimal,
    /// Days taken as unpaid leave.
    pub unpaid_days: Decimal,
    /// Days beyond the remaining balance.
    pub excess_days: Decimal,
    /// Whether any days were converted.
    pub converted_to_unpaid: bool,
}

impl ExcessDaysHandling {
    /// Every day is paid.
    #[must_use]
    pub fn all_paid(days: Decimal) -> Self {
        Self {
            paid_days: days,
            ..Self::default()
        }
    }

    /// Every day is unpaid; used for leave types that are unpaid by nature,
    /// which never touch the balance.
    #[must_use]
    pub fn all_unpaid(days: Decimal) -> Self {
        Self {
            unpaid_days: days,
            ..Self::default()
        }
    }

    /// Splits `requested` against `remaining`.
    ///
    /// Fails with `InsufficientBalance` when the request does not fit and
    /// the leave type forbids unpaid excess.
    pub fn split(
        requested: Decimal,
        remaining: Decimal,
        allow_unpaid_excess: bool,
    ) -> Result<Self, LedgerError> {
        if requested <= remaining {
            return Ok(Self::all_paid(requested));
        }
        if !allow_unpaid_excess {
            return Err(LedgerError::InsufficientBalance {
                requested,
                remaining,
            });
        }
        let paid_days = remaining.max(Decimal::ZERO);
        let unpaid_days = requested - paid_days;
        Ok(Self {
            paid_days,
            unpaid_days,
            excess_days: unpaid_days,
            converted_to_unpaid: true,
        })
    }

    /// Total days represented.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.paid_days + self.unpaid_days
    }
}
