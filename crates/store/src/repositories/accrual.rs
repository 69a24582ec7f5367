//! Accrual, rollover and carryover-expiry runs.
//!
//! Each run fans out over employees (or balances) with rayon; every
//! balance is written through its own CAS cycle, so runs may overlap with
//! request traffic and with each other.

use std::sync::Arc;

use chrono::NaiveDate;
use furlough_core::balance::{BalanceKey, LedgerError};
use furlough_core::policy::LeaveType;
use rayon::prelude::*;
use rust_decimal::Decimal;

use super::balance::BalanceRepository;
use super::catalog::PolicyCatalog;

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccrualRunReport {
    /// Balances looked at.
    pub examined: usize,
    /// Balances changed.
    pub applied: usize,
    /// Days credited, carried or expired.
    pub days: Decimal,
    /// Balances whose update failed, with the reason.
    pub failures: Vec<(BalanceKey, String)>,
}

impl AccrualRunReport {
    fn record(&mut self, key: BalanceKey, outcome: Result<Option<Decimal>, LedgerError>) {
        self.examined += 1;
        match outcome {
            Ok(Some(days)) => {
                self.applied += 1;
                self.days += days;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Balance update failed");
                self.failures.push((key, e.to_string()));
            }
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.examined += other.examined;
        self.applied += other.applied;
        self.days += other.days;
        self.failures.extend(other.failures);
        self
    }
}

/// Periodic balance maintenance.
pub struct AccrualRepository {
    balances: Arc<BalanceRepository>,
    catalog: Arc<PolicyCatalog>,
}

impl AccrualRepository {
    /// Creates the repository.
    #[must_use]
    pub fn new(balances: Arc<BalanceRepository>, catalog: Arc<PolicyCatalog>) -> Self {
        Self { balances, catalog }
    }

    /// Credits due accrual periods for every eligible employee and paid
    /// leave type governed by a package.
    pub fn run_accruals(&self, today: NaiveDate) -> AccrualRunReport {
        let leave_types: Vec<LeaveType> = self
            .catalog
            .leave_types()
            .into_iter()
            .filter(|lt| lt.is_active && lt.is_paid)
            .collect();
        let employees = self.catalog.employees();

        let report = employees
            .par_iter()
            .map(|employee| {
                let mut report = AccrualRunReport::default();
                for leave_type in &leave_types {
                    let Some(package) = self.catalog.package_for(employee, leave_type.id, today) else {
                        continue;
                    };
                    let year = package.reset.leave_year_of(employee, today);
                    let key = BalanceKey::new(employee.id, leave_type.id, year);
                    let outcome = self
                        .balances
                        .accrue(key, &package, employee, leave_type, today)
                        .map(|plan| plan.filter(|p| p.days > Decimal::ZERO).map(|p| p.days));
                    report.record(key, outcome);
                }
                report
            })
            .reduce(AccrualRunReport::default, AccrualRunReport::merge);

        tracing::info!(
            %today,
            examined = report.examined,
            credited = report.applied,
            days = %report.days,
            failures = report.failures.len(),
            "Accrual run finished"
        );
        report
    }

    /// Closes every leave year that has ended, carrying over what the
    /// package allows. Repeats until no year is left to close, so a
    /// balance several years behind catches up in one run.
    pub fn run_rollovers(&self, today: NaiveDate) -> AccrualRunReport {
        let mut total = AccrualRunReport::default();
        loop {
            let open = self.balances.filter(|b| b.rolled_over_into.is_none());
            let pass = open
                .par_iter()
                .map(|balance| {
                    let mut report = AccrualRunReport::default();
                    let key = balance.key;
                    let (Some(leave_type), Some(employee)) = (
                        self.catalog.leave_type(key.leave_type_id),
                        self.catalog.employee(key.employee_id),
                    ) else {
                        return report;
                    };
                    let package = self.catalog.package_for(&employee, leave_type.id, today);
                    let outcome = self
                        .balances
                        .rollover(key, &leave_type, package.as_ref(), &employee, today)
                        .map(|plan| plan.map(|p| p.carry));
                    report.record(key, outcome);
                    report
                })
                .reduce(AccrualRunReport::default, AccrualRunReport::merge);
            let progressed = pass.applied > 0;
            total = total.merge(pass);
            if !progressed {
                break;
            }
        }

        tracing::info!(
            %today,
            closed = total.applied,
            carried = %total.days,
            failures = total.failures.len(),
            "Rollover run finished"
        );
        total
    }

    /// Expires unconsumed carryover whose expiry date has been reached.
    pub fn run_expiries(&self, today: NaiveDate) -> AccrualRunReport {
        let due = self.balances.filter(|b| {
            !b.carry_over_expired && b.carry_over_expires_on.is_some_and(|on| on <= today)
        });
        let report = due
            .par_iter()
            .map(|balance| {
                let mut report = AccrualRunReport::default();
                let key = balance.key;
                let Some(leave_type) = self.catalog.leave_type(key.leave_type_id) else {
                    return report;
                };
                report.record(key, self.balances.expire_carry_over(key, &leave_type, today));
                report
            })
            .reduce(AccrualRunReport::default, AccrualRunReport::merge);

        tracing::info!(
            %today,
            expired = report.applied,
            days = %report.days,
            failures = report.failures.len(),
            "Carryover expiry run finished"
        );
        report
    }
}
