//! Accrual, rollover and expiry runs.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use common::{Harness, at, d, monthly_package};
use furlough_core::balance::{AdjustmentInput, AdjustmentType, BalanceKey};
use furlough_shared::config::AppConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_year_cycle_accrue_carry_expire() {
    let h = Harness::new();
    let p = &h.people;
    h.catalog.add_package(monthly_package(h.annual.id, dec!(1.75)));
    let accrual = h.service.accrual();

    let report = accrual.run_accruals(d(2025, 3, 15));
    assert_eq!(report.applied, 4);
    assert_eq!(report.days, dec!(21));
    assert!(report.failures.is_empty());
    let balance = h.service.get_balance(h.key(p.requester)).unwrap().value;
    assert_eq!(balance.accrued, dec!(5.25));
    assert_eq!(balance.last_accrual_period, Some(d(2025, 3, 1)));

    let rerun = accrual.run_accruals(d(2025, 3, 20));
    assert_eq!(rerun.applied, 0);
    assert_eq!(h.service.get_balance(h.key(p.requester)).unwrap().value.accrued, dec!(5.25));

    assert_eq!(accrual.run_rollovers(d(2025, 12, 31)).applied, 0);
    h.clock.set(at(2026, 1, 2, 1));
    let rolled = accrual.run_rollovers(d(2026, 1, 2));
    assert_eq!(rolled.applied, 4);
    assert_eq!(rolled.days, dec!(20));

    let prior = h.service.get_balance(h.key(p.requester)).unwrap().value;
    assert_eq!(prior.rolled_over_into, Some(2026));
    let next_key = BalanceKey::new(p.requester, h.annual.id, 2026);
    let next = h.service.get_balance(next_key).unwrap().value;
    assert_eq!(next.carried_over, dec!(5));
    assert_eq!(next.carry_over_expires_on, Some(d(2026, 4, 1)));
    assert_eq!(accrual.run_rollovers(d(2026, 1, 3)).applied, 0);

    assert_eq!(accrual.run_expiries(d(2026, 3, 31)).applied, 0);
    h.clock.set(at(2026, 4, 1, 1));
    let expired = accrual.run_expiries(d(2026, 4, 1));
    assert_eq!(expired.applied, 4);
    let next = h.service.get_balance(next_key).unwrap().value;
    assert!(next.carry_over_expired);
    assert_eq!(next.remaining(), Decimal::ZERO);

    let kinds: Vec<_> = h
        .service
        .balances()
        .log()
        .for_employee(p.requester)
        .iter()
        .map(|row| row.adjustment_type)
        .collect();
    assert_eq!(
        kinds,
        vec![AdjustmentType::Accrual, AdjustmentType::CarryOver, AdjustmentType::Reset]
    );
}

#[test]
fn test_rollover_catches_up_several_years() {
    let h = Harness::new();
    let p = &h.people;
    h.catalog.add_package(monthly_package(h.annual.id, dec!(1.75)));
    h.credit(p.requester, dec!(8));

    let report = h.service.accrual().run_rollovers(d(2027, 2, 1));
    assert_eq!(report.applied, 2);
    let y2026 = h.service.get_balance(BalanceKey::new(p.requester, h.annual.id, 2026)).unwrap().value;
    assert_eq!(y2026.carried_over, dec!(5));
    assert_eq!(y2026.rolled_over_into, Some(2027));
    let y2027 = h.service.get_balance(BalanceKey::new(p.requester, h.annual.id, 2027)).unwrap().value;
    assert_eq!(y2027.carried_over, dec!(5));
}

#[test]
fn test_accrual_skips_without_package() {
    let h = Harness::new();
    let report = h.service.accrual().run_accruals(d(2025, 3, 15));
    assert_eq!(report.examined, 0);
    assert!(h.service.get_balance(h.key(h.people.requester)).is_err());
}

#[test]
fn test_rollover_under_contention_carries_once() {
    let mut config = AppConfig::default();
    config.workflow.max_write_retries = 0;
    let h = Harness::with_config(config);
    let p = &h.people;
    let package = monthly_package(h.annual.id, dec!(1.75));
    h.catalog.add_package(package.clone());
    h.credit(p.requester, dec!(8));
    let employee = h.catalog.employee(p.requester).unwrap();
    let prior_key = h.key(p.requester);
    let next_key = BalanceKey::new(p.requester, h.annual.id, 2026);
    let balances = h.service.balances();
    balances.get_or_create(next_key);

    let stop = AtomicBool::new(false);
    let closed = thread::scope(|s| {
        for key in [prior_key, next_key] {
            let balances = h.service.balances();
            let annual = h.annual.clone();
            let stop = &stop;
            s.spawn(move || {
                let mut delta = Decimal::ONE;
                while !stop.load(Ordering::Relaxed) {
                    let input = AdjustmentInput {
                        adjustment_type: AdjustmentType::Manual,
                        delta,
                        reason: "Correction".to_string(),
                        performed_by: None,
                    };
                    if balances.adjust(key, &input, &annual).is_ok() {
                        delta = -delta;
                    }
                }
            });
        }

        let closed = (0..10_000).any(|_| {
            let _ = balances.rollover(prior_key, &h.annual, Some(&package), &employee, d(2026, 1, 2));
            balances.get(&prior_key).is_some_and(|b| b.rolled_over_into.is_some())
        });
        stop.store(true, Ordering::Relaxed);
        closed
    });

    assert!(closed);
    let next = balances.get(&next_key).unwrap();
    assert_eq!(next.carried_over, dec!(5));
    assert_eq!(next.carried_from, Some(2025));
    let carry_rows = balances
        .history(&next_key)
        .iter()
        .filter(|row| row.adjustment_type == AdjustmentType::CarryOver)
        .count();
    assert_eq!(carry_rows, 1);
}
