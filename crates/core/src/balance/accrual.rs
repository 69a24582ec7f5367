//! Accrual, rollover and carryover expiry.
//!
//! Planning is separated from application so that the scheduled runs can
//! log what they are about to do and skip records with nothing due. Each
//! `apply_*` goes through `LedgerService::adjust`, so every credit or
//! expiry leaves an audit row.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::adjustment::{AdjustmentInput, AdjustmentType, LeaveAdjustment};
use super::error::LedgerError;
use super::ledger::LedgerService;
use super::types::{BalanceKey, EmployeeLeaveBalance};
use crate::policy::{EmployeeProfile, LeaveType, ResetCriterion, VacationPackage};

/// Accrual periods due for one balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualPlan {
    /// Start dates of the periods covered, oldest first.
    pub periods: Vec<NaiveDate>,
    /// Days to credit.
    pub days: Decimal,
    /// Accrual is paused; the periods are skipped without credit.
    pub paused: bool,
}

/// Year rollover for one balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverPlan {
    /// Prior-year key.
    pub from: BalanceKey,
    /// New-year key.
    pub to: BalanceKey,
    /// Days carried into the new year.
    pub carry: Decimal,
    /// When the carried days expire.
    pub expires_on: Option<NaiveDate>,
}

/// Stateless accrual and carryover rules.
pub struct AccrualService;

impl AccrualService {
    /// Periods of `balance`'s leave year that have started by `today` and
    /// were not yet credited.
    ///
    /// Returns `None` when nothing is due.
    #[must_use]
    pub fn plan_accrual(
        balance: &EmployeeLeaveBalance,
        package: &VacationPackage,
        employee: &EmployeeProfile,
        today: NaiveDate,
    ) -> Option<AccrualPlan> {
        let frequency = package.accrual.frequency;
        let year_start = package.reset.leave_year_start(employee, balance.key.year);
        let next_year_start = package.reset.leave_year_start(employee, balance.key.year + 1);
        let year_end_period = frequency.period_start(next_year_start, next_year_start);

        let first = match balance.last_accrual_period {
            Some(last) => frequency.next_period(last)?,
            None => frequency.period_start(year_start.max(employee.hire_date), year_start),
        };

        let mut periods = Vec::new();
        let mut cursor = Some(first);
        while let Some(period) = cursor {
            if period > today || period >= year_end_period {
                break;
            }
            periods.push(period);
            cursor = frequency.next_period(period);
        }
        if periods.is_empty() {
            return None;
        }

        let paused = package.accrual.is_paused_for(employee);
        let days = if paused {
            Decimal::ZERO
        } else {
            package.accrual.rate * Decimal::from(periods.len())
        };
        Some(AccrualPlan {
            periods,
            days,
            paused,
        })
    }

    /// Credits an accrual plan and advances the accrual marker.
    pub fn apply_accrual(
        balance: &EmployeeLeaveBalance,
        plan: &AccrualPlan,
        leave_type: &LeaveType,
        now: DateTime<Utc>,
    ) -> Result<(EmployeeLeaveBalance, Option<LeaveAdjustment>), LedgerError> {
        let Some(&last) = plan.periods.last() else {
            return Ok((balance.clone(), None));
        };

        let (mut next, row) = if plan.days > Decimal::ZERO {
            let input = AdjustmentInput {
                adjustment_type: AdjustmentType::Accrual,
                delta: plan.days,
                reason: format!(
                    "Accrual for {} period(s) through {last}",
                    plan.periods.len()
                ),
                performed_by: None,
            };
            let (next, row) = LedgerService::adjust(balance, &input, leave_type, now)?;
            (next, Some(row))
        } else {
            let mut next = balance.clone();
            next.updated_at = now;
            (next, None)
        };
        next.last_accrual_period = Some(last);
        Ok((next, row))
    }

    /// Works out the rollover of `prior` once its leave year has ended.
    ///
    /// Carryover requires both a carry-eligible leave type and a package;
    /// the carried amount is capped by the package unless unlimited.
    #[must_use]
    pub fn plan_rollover(
        prior: &EmployeeLeaveBalance,
        leave_type: &LeaveType,
        package: Option<&VacationPackage>,
        employee: &EmployeeProfile,
        today: NaiveDate,
    ) -> Option<RolloverPlan> {
        if prior.rolled_over_into.is_some() {
            return None;
        }
        let reset = package.map_or(ResetCriterion::CalendarYear, |p| p.reset);
        if reset.leave_year_of(employee, today) <= prior.key.year {
            return None;
        }

        let carry = match package {
            Some(p) if leave_type.carry_over_eligible => {
                p.carry_over.carry_amount(prior.remaining())
            }
            _ => Decimal::ZERO,
        };
        let next_year_start = reset.leave_year_start(employee, prior.key.year + 1);
        let expires_on = package
            .filter(|p| p.carry_over.expiry_months > 0 && carry > Decimal::ZERO)
            .and_then(|p| next_year_start.checked_add_months(Months::new(p.carry_over.expiry_months)));

        Some(RolloverPlan {
            from: prior.key,
            to: prior.key.next_year(),
            carry,
            expires_on,
        })
    }

    /// Applies a rollover: marks `prior` as rolled over and credits the
    /// carried days to `next`.
    ///
    /// The new year's buckets start from whatever `next` holds (a fresh
    /// record, or one already created by a request in the new year).
    pub fn apply_rollover(
        prior: &EmployeeLeaveBalance,
        next: &EmployeeLeaveBalance,
        plan: &RolloverPlan,
        leave_type: &LeaveType,
        now: DateTime<Utc>,
    ) -> Result<(EmployeeLeaveBalance, EmployeeLeaveBalance, Option<LeaveAdjustment>), LedgerError> {
        if let Some(into) = prior.rolled_over_into {
            return Err(LedgerError::AlreadyRolledOver {
                key: prior.key,
                into,
            });
        }

        let mut closed = prior.clone();
        closed.rolled_over_into = Some(plan.to.year);
        closed.updated_at = now;

        if next.carried_from == Some(plan.from.year) {
            return Ok((closed, next.clone(), None));
        }
        let (mut opened, row) = if plan.carry > Decimal::ZERO {
            let input = AdjustmentInput {
                adjustment_type: AdjustmentType::CarryOver,
                delta: plan.carry,
                reason: format!("Carryover from leave year {}", plan.from.year),
                performed_by: None,
            };
            let (opened, row) = LedgerService::adjust(next, &input, leave_type, now)?;
            (opened, Some(row))
        } else {
            (next.clone(), None)
        };
        opened.carry_over_expires_on = plan.expires_on;
        opened.carry_over_expired = false;
        opened.carried_from = Some(plan.from.year);
        opened.updated_at = now;

        Ok((closed, opened, row))
    }

    /// Days of unconsumed carryover to expire on `today`, if the expiry is due.
    ///
    /// Carryover is consumed first, so the unconsumed part is whatever of it
    /// is still covered by `remaining`.
    #[must_use]
    pub fn plan_expiry(balance: &EmployeeLeaveBalance, today: NaiveDate) -> Option<Decimal> {
        let expires_on = balance.carry_over_expires_on?;
        if balance.carry_over_expired || today < expires_on {
            return None;
        }
        Some(balance.carried_over.min(balance.remaining().max(Decimal::ZERO)))
    }

    /// Zeroes unconsumed carryover through a `reset` adjustment.
    pub fn apply_expiry(
        balance: &EmployeeLeaveBalance,
        amount: Decimal,
        leave_type: &LeaveType,
        now: DateTime<Utc>,
    ) -> Result<(EmployeeLeaveBalance, Option<LeaveAdjustment>), LedgerError> {
        let (mut next, row) = if amount > Decimal::ZERO {
            let expired_on = balance
                .carry_over_expires_on
                .map_or_else(|| "expiry".to_string(), |d| d.to_string());
            let input = AdjustmentInput {
                adjustment_type: AdjustmentType::Reset,
                delta: -amount,
                reason: format!("Carryover expired on {expired_on}"),
                performed_by: None,
            };
            let (next, row) = LedgerService::adjust(balance, &input, leave_type, now)?;
            (next, Some(row))
        } else {
            (balance.clone(), None)
        };
        next.carry_over_expired = true;
        next.updated_at = now;
        Ok((next, row))
    }
}
