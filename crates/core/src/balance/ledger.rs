//! Reserve / commit / release / adjust arithmetic.
//!
//! Every function takes the current record and returns the next one; the
//! caller persists it with compare-and-swap and retries on a lost race.
//! The invariant check runs on every returned record.

use chrono::{DateTime, Utc};
use furlough_shared::types::AdjustmentId;
use rust_decimal::Decimal;

use super::adjustment::{AdjustmentBucket, AdjustmentInput, AdjustmentType, LeaveAdjustment};
use super::error::LedgerError;
use super::excess::ExcessDaysHandling;
use super::types::EmployeeLeaveBalance;
use crate::policy::LeaveType;

/// Result of a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Record with `pending` incremented by the paid portion.
    pub balance: EmployeeLeaveBalance,
    /// How the request split.
    pub excess: ExcessDaysHandling,
}

/// Stateless ledger arithmetic.
pub struct LedgerService;

impl LedgerService {
    /// Reserves `requested` days.
    ///
    /// Only the paid portion increments `pending`; days beyond `remaining`
    /// convert to unpaid when `allow_unpaid_excess` is set.
    pub fn reserve(
        balance: &EmployeeLeaveBalance,
        requested: Decimal,
        allow_unpaid_excess: bool,
        now: DateTime<Utc>,
    ) -> Result<Reservation, LedgerError> {
        Self::ensure_positive(requested)?;
        let excess = ExcessDaysHandling::split(requested, balance.remaining(), allow_unpaid_excess)?;
        let mut next = balance.clone();
        next.pending += excess.paid_days;
        Self::finish(&mut next, now)?;
        Ok(Reservation {
            balance: next,
            excess,
        })
    }

    /// Settles a reservation on final approval: moves `paid_days` from
    /// `pending` to `taken`.
    pub fn commit(
        balance: &EmployeeLeaveBalance,
        paid_days: Decimal,
        now: DateTime<Utc>,
    ) -> Result<EmployeeLeaveBalance, LedgerError> {
        Self::ensure_settleable(balance, paid_days)?;
        let mut next = balance.clone();
        next.pending -= paid_days;
        next.taken += paid_days;
        Self::finish(&mut next, now)?;
        Ok(next)
    }

    /// Drops a reservation on rejection or cancellation.
    pub fn release(
        balance: &EmployeeLeaveBalance,
        paid_days: Decimal,
        now: DateTime<Utc>,
    ) -> Result<EmployeeLeaveBalance, LedgerError> {
        Self::ensure_settleable(balance, paid_days)?;
        let mut next = balance.clone();
        next.pending -= paid_days;
        Self::finish(&mut next, now)?;
        Ok(next)
    }

    /// Reverses a commit whose request write was lost: moves `paid_days`
    /// from `taken` back to `pending`.
    pub fn reopen(
        balance: &EmployeeLeaveBalance,
        paid_days: Decimal,
        now: DateTime<Utc>,
    ) -> Result<EmployeeLeaveBalance, LedgerError> {
        Self::ensure_positive(paid_days)?;
        if paid_days > balance.taken {
            return Err(LedgerError::ReservationUnderflow {
                pending: balance.taken,
                requested: paid_days,
            });
        }
        let mut next = balance.clone();
        next.taken -= paid_days;
        next.pending += paid_days;
        Self::finish(&mut next, now)?;
        Ok(next)
    }

    /// Reverses a release whose request write was lost.
    pub fn restore(
        balance: &EmployeeLeaveBalance,
        paid_days: Decimal,
        now: DateTime<Utc>,
    ) -> Result<EmployeeLeaveBalance, LedgerError> {
        Self::ensure_positive(paid_days)?;
        let mut next = balance.clone();
        next.pending += paid_days;
        Self::finish(&mut next, now)?;
        Ok(next)
    }

    /// Applies a direct adjustment and produces its audit row.
    pub fn adjust(
        balance: &EmployeeLeaveBalance,
        input: &AdjustmentInput,
        leave_type: &LeaveType,
        now: DateTime<Utc>,
    ) -> Result<(EmployeeLeaveBalance, LeaveAdjustment), LedgerError> {
        if input.delta.is_zero() {
            return Err(LedgerError::ZeroAdjustment);
        }
        if input.reason.trim().is_empty() {
            return Err(LedgerError::AdjustmentReasonRequired);
        }
        if input.adjustment_type == AdjustmentType::Encashment {
            Self::check_encashment(balance, input.delta, leave_type)?;
        }

        let mut next = balance.clone();
        match input.adjustment_type.bucket() {
            AdjustmentBucket::Accrued => next.accrued += input.delta,
            AdjustmentBucket::CarriedOver => next.carried_over += input.delta,
            AdjustmentBucket::ManualAdjustments => next.manual_adjustments += input.delta,
        }
        Self::finish(&mut next, now)?;

        let adjustment = LeaveAdjustment {
            id: AdjustmentId::new(),
            key: balance.key,
            adjustment_type: input.adjustment_type,
            delta: input.delta,
            before: balance.snapshot(),
            after: next.snapshot(),
            reason: input.reason.trim().to_string(),
            performed_by: input.performed_by,
            created_at: now,
        };
        Ok((next, adjustment))
    }

    fn check_encashment(
        balance: &EmployeeLeaveBalance,
        delta: Decimal,
        leave_type: &LeaveType,
    ) -> Result<(), LedgerError> {
        if !leave_type.encashment_eligible {
            return Err(LedgerError::EncashmentNotAllowed);
        }
        if delta >= Decimal::ZERO {
            return Err(LedgerError::EncashmentNotNegative(delta));
        }
        if -delta > balance.remaining() {
            return Err(LedgerError::EncashmentExceedsRemaining {
                requested: -delta,
                remaining: balance.remaining(),
            });
        }
        Ok(())
    }

    fn ensure_positive(days: Decimal) -> Result<(), LedgerError> {
        if days <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveDays(days));
        }
        Ok(())
    }

    fn ensure_settleable(balance: &EmployeeLeaveBalance, paid_days: Decimal) -> Result<(), LedgerError> {
        if paid_days.is_sign_negative() && !paid_days.is_zero() {
            return Err(LedgerError::NonPositiveDays(paid_days));
        }
        if paid_days > balance.pending {
            return Err(LedgerError::ReservationUnderflow {
                pending: balance.pending,
                requested: paid_days,
            });
        }
        Ok(())
    }

    fn finish(next: &mut EmployeeLeaveBalance, now: DateTime<Utc>) -> Result<(), LedgerError> {
        next.recompute();
        next.updated_at = now;
        next.check_invariants()
    }
}
