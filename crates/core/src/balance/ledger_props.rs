//! Property-based tests for LedgerService.
//!
//! - Property 1: ledger equation holds after every operation
//! - Property 2: reserve then release restores the record
//! - Property 3: reserve then commit moves exactly the paid portion

use chrono::Utc;
use furlough_shared::types::{EmployeeId, LeaveTypeId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::adjustment::{AdjustmentInput, AdjustmentType};
use super::ledger::LedgerService;
use super::types::{BalanceKey, EmployeeLeaveBalance};
use crate::policy::LeaveType;

/// Strategy for non-negative half-day quantities (0.0 to 60.0).
fn half_days() -> impl Strategy<Value = Decimal> {
    (0i64..=120i64).prop_map(|halves| Decimal::new(halves * 5, 1))
}

/// Strategy for positive half-day quantities (0.5 to 40.0).
fn positive_days() -> impl Strategy<Value = Decimal> {
    (1i64..=80i64).prop_map(|halves| Decimal::new(halves * 5, 1))
}

/// Strategy for signed adjustment deltas (-20.0 to 20.0, never zero).
fn delta() -> impl Strategy<Value = Decimal> {
    prop_oneof![(-40i64..=-1i64), (1i64..=40i64)].prop_map(|halves| Decimal::new(halves * 5, 1))
}

fn adjustment_type() -> impl Strategy<Value = AdjustmentType> {
    prop_oneof![
        Just(AdjustmentType::Manual),
        Just(AdjustmentType::Accrual),
        Just(AdjustmentType::CarryOver),
        Just(AdjustmentType::Reset),
        Just(AdjustmentType::Encashment),
        Just(AdjustmentType::Correction),
    ]
}

/// Strategy for consistent balance records.
fn balance() -> impl Strategy<Value = EmployeeLeaveBalance> {
    (half_days(), half_days(), half_days(), half_days(), half_days()).prop_map(
        |(accrued, carried_over, manual, taken, pending)| {
            let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
            let mut b = EmployeeLeaveBalance::new(key, Utc::now());
            b.accrued = accrued;
            b.carried_over = carried_over;
            b.manual_adjustments = manual - Decimal::from(30);
            b.taken = taken;
            b.pending = pending;
            b.recompute();
            b
        },
    )
}

fn leave_type() -> LeaveType {
    LeaveType {
        id: LeaveTypeId::new(),
        code: "ANNUAL".to_string(),
        name: "Annual leave".to_string(),
        is_paid: true,
        allow_unpaid_excess: true,
        max_days_per_request: None,
        max_days_per_year: None,
        document_required_after_days: None,
        carry_over_eligible: true,
        encashment_eligible: true,
        payroll_code: "AL".to_string(),
        is_active: true,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: every accepted reservation keeps the equation and
    /// never reserves more than is remaining.
    #[test]
    fn prop_reserve_preserves_invariant(b in balance(), days in positive_days()) {
        let reservation = LedgerService::reserve(&b, days, true, Utc::now()).unwrap();
        prop_assert!(reservation.balance.check_invariants().is_ok());
        prop_assert_eq!(reservation.excess.total(), days);
        prop_assert!(reservation.excess.paid_days <= b.remaining().max(Decimal::ZERO));
        prop_assert_eq!(reservation.balance.pending, b.pending + reservation.excess.paid_days);
    }

    /// Property 1: adjustments either fail or leave a consistent record
    /// whose audit row matches it.
    #[test]
    fn prop_adjust_preserves_invariant(
        b in balance(),
        adjustment_type in adjustment_type(),
        delta in delta(),
    ) {
        let input = AdjustmentInput {
            adjustment_type,
            delta,
            reason: "property".to_string(),
            performed_by: None,
        };
        if let Ok((next, row)) = LedgerService::adjust(&b, &input, &leave_type(), Utc::now()) {
            prop_assert!(next.check_invariants().is_ok());
            prop_assert_eq!(row.after, next.snapshot());
            prop_assert_eq!(row.before, b.snapshot());
            prop_assert_eq!(next.remaining() - b.remaining(), delta);
        }
    }

    /// Property 2: reserve then release is the identity on the buckets.
    #[test]
    fn prop_reserve_release_identity(b in balance(), days in positive_days()) {
        let reservation = LedgerService::reserve(&b, days, true, Utc::now()).unwrap();
        let released =
            LedgerService::release(&reservation.balance, reservation.excess.paid_days, Utc::now())
                .unwrap();
        prop_assert_eq!(released.snapshot(), b.snapshot());
    }

    /// Property 3: reserve then commit moves the paid portion into taken.
    #[test]
    fn prop_reserve_commit_transfer(b in balance(), days in positive_days()) {
        let reservation = LedgerService::reserve(&b, days, true, Utc::now()).unwrap();
        let paid = reservation.excess.paid_days;
        let committed = LedgerService::commit(&reservation.balance, paid, Utc::now()).unwrap();
        prop_assert_eq!(committed.pending, b.pending);
        prop_assert_eq!(committed.taken, b.taken + paid);
        prop_assert_eq!(committed.remaining(), b.remaining() - paid);
        prop_assert!(committed.check_invariants().is_ok());
    }
}
