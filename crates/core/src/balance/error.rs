//! Ledger error types.

use furlough_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::BalanceKey;
use crate::error::ErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// The leave type forbids unpaid excess and the balance is too low.
    #[error("Insufficient balance: requested {requested}, remaining {remaining}")]
    InsufficientBalance {
        /// Days requested.
        requested: Decimal,
        /// Days remaining.
        remaining: Decimal,
    },

    /// Reserve, commit and release take strictly positive day counts.
    #[error("Day count must be positive, got {0}")]
    NonPositiveDays(Decimal),

    /// Adjustments must change something.
    #[error("Adjustment delta cannot be zero")]
    ZeroAdjustment,

    /// An adjustment needs a reason.
    #[error("Adjustment reason is required")]
    AdjustmentReasonRequired,

    /// The leave type is not encashment-eligible.
    #[error("Leave type does not allow encashment")]
    EncashmentNotAllowed,

    /// Encashment pays days out, so the delta must be negative.
    #[error("Encashment delta must be negative, got {0}")]
    EncashmentNotNegative(Decimal),

    /// Encashment larger than the remaining balance.
    #[error("Encashment of {requested} exceeds remaining {remaining}")]
    EncashmentExceedsRemaining {
        /// Days to encash.
        requested: Decimal,
        /// Days remaining.
        remaining: Decimal,
    },

    /// A non-negative bucket would go below zero.
    #[error("Bucket {bucket} would become negative ({value})")]
    NegativeBucket {
        /// Bucket name.
        bucket: &'static str,
        /// Offending value.
        value: Decimal,
    },

    // ========== State Errors ==========
    /// Releasing or committing more than is reserved.
    #[error("Cannot settle {requested} days, only {pending} pending")]
    ReservationUnderflow {
        /// Days currently reserved.
        pending: Decimal,
        /// Days the caller tried to settle.
        requested: Decimal,
    },

    /// The ledger equation does not hold.
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    /// The prior year was already rolled over.
    #[error("Balance {key} was already rolled over into {into}")]
    AlreadyRolledOver {
        /// Prior-year key.
        key: BalanceKey,
        /// Year it was rolled into.
        into: i32,
    },

    /// No record for the key.
    #[error("Balance {0} not found")]
    BalanceNotFound(BalanceKey),

    /// Lost the compare-and-swap race more often than allowed.
    #[error("Balance {0} was modified concurrently")]
    ConcurrentModification(BalanceKey),

    /// Persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Category of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBalance { .. }
            | Self::NonPositiveDays(_)
            | Self::ZeroAdjustment
            | Self::AdjustmentReasonRequired
            | Self::EncashmentNotAllowed
            | Self::EncashmentNotNegative(_)
            | Self::EncashmentExceedsRemaining { .. }
            | Self::NegativeBucket { .. } => ErrorKind::Validation,
            Self::AlreadyRolledOver { .. } | Self::ConcurrentModification(_) => {
                ErrorKind::Conflict
            }
            Self::BalanceNotFound(_) => ErrorKind::NotFound,
            Self::ReservationUnderflow { .. } | Self::InvariantViolation(_) | Self::Storage(_) => {
                ErrorKind::Internal
            }
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
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::NonPositiveDays(_) => "NON_POSITIVE_DAYS",
            Self::ZeroAdjustment => "ZERO_ADJUSTMENT",
            Self::AdjustmentReasonRequired => "ADJUSTMENT_REASON_REQUIRED",
            Self::EncashmentNotAllowed => "ENCASHMENT_NOT_ALLOWED",
            Self::EncashmentNotNegative(_) => "ENCASHMENT_NOT_NEGATIVE",
            Self::EncashmentExceedsRemaining { .. } => "ENCASHMENT_EXCEEDS_REMAINING",
            Self::NegativeBucket { .. } => "NEGATIVE_BUCKET",
            Self::ReservationUnderflow { .. } => "RESERVATION_UNDERFLOW",
            Self::InvariantViolation(_) => "LEDGER_INVARIANT_VIOLATION",
            Self::AlreadyRolledOver { .. } => "ALREADY_ROLLED_OVER",
            Self::BalanceNotFound(_) => "BALANCE_NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(message) => Self::Storage(message),
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furlough_shared::types::{EmployeeId, LeaveTypeId};
    use rust_decimal_macros::dec;

    fn key() -> BalanceKey {
        BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025)
    }

    #[test]
    fn test_insufficient_balance_error() {
        let err = LedgerError::InsufficientBalance {
            requested: dec!(10),
            remaining: dec!(4),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_concurrent_modification_error() {
        let err = LedgerError::ConcurrentModification(key());
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_not_found_error() {
        let err = LedgerError::BalanceNotFound(key());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "BALANCE_NOT_FOUND");
    }

    #[test]
    fn test_underflow_is_internal() {
        let err = LedgerError::ReservationUnderflow {
            pending: dec!(1),
            requested: dec!(2),
        };
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::ZeroAdjustment.into();
        assert!(matches!(app, AppError::Validation(_)));
        let app: AppError = LedgerError::Storage("down".to_string()).into();
        assert!(matches!(app, AppError::Storage(_)));
    }
}
