//! Audit rows for ledger mutations.

use chrono::{DateTime, Utc};
use furlough_shared::types::{AdjustmentId, EmployeeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{BalanceKey, BalanceSnapshot};

/// Why a balance was adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    /// HR manual adjustment.
    Manual,
    /// Scheduled accrual credit.
    Accrual,
    /// Carryover from the prior leave year.
    CarryOver,
    /// Expiry of unconsumed carryover.
    Reset,
    /// Pay-out of unused days.
    Encashment,
    /// Correction of an earlier mistake.
    Correction,
}

/// Ledger bucket an adjustment lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentBucket {
    /// `accrued`.
    Accrued,
    /// `carried_over`.
    CarriedOver,
    /// `manual_adjustments`.
    ManualAdjustments,
}

impl AdjustmentType {
    /// Bucket this adjustment type mutates.
    #[must_use]
    pub const fn bucket(self) -> AdjustmentBucket {
        match self {
            Self::Accrual => AdjustmentBucket::Accrued,
            Self::CarryOver | Self::Reset => AdjustmentBucket::CarriedOver,
            Self::Manual | Self::Encashment | Self::Correction => {
                AdjustmentBucket::ManualAdjustments
            }
        }
    }

    /// Returns true for adjustments written by scheduled runs.
    #[must_use]
    pub const fn is_system(self) -> bool {
        matches!(self, Self::Accrual | Self::CarryOver | Self::Reset)
    }
}

/// Requested adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentInput {
    /// Kind of adjustment.
    pub adjustment_type: AdjustmentType,
    /// Signed change in days.
    pub delta: Decimal,
    /// Free-text justification.
    pub reason: String,
    /// Actor; `None` for system runs.
    pub performed_by: Option<EmployeeId>,
}

/// Immutable audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAdjustment {
    /// Identifier.
    pub id: AdjustmentId,
    /// Balance adjusted.
    pub key: BalanceKey,
    /// Kind of adjustment.
    pub adjustment_type: AdjustmentType,
    /// Signed change in days.
    pub delta: Decimal,
    /// Buckets before the mutation.
    pub before: BalanceSnapshot,
    /// Buckets after the mutation.
    pub after: BalanceSnapshot,
    /// Justification.
    pub reason: String,
    /// Actor; `None` for system runs.
    pub performed_by: Option<EmployeeId>,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets() {
        assert_eq!(AdjustmentType::Accrual.bucket(), AdjustmentBucket::Accrued);
        assert_eq!(AdjustmentType::Reset.bucket(), AdjustmentBucket::CarriedOver);
        assert_eq!(AdjustmentType::CarryOver.bucket(), AdjustmentBucket::CarriedOver);
        assert_eq!(
            AdjustmentType::Encashment.bucket(),
            AdjustmentBucket::ManualAdjustments
        );
        assert!(AdjustmentType::Reset.is_system());
        assert!(!AdjustmentType::Correction.is_system());
    }

    #[test]
    fn test_adjustment_type_serde() {
        let json = serde_json::to_string(&AdjustmentType::CarryOver).unwrap();
        assert_eq!(json, "\"carry_over\"");
    }
}
