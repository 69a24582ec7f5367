//! Balance repository.
//!
//! Runs `LedgerService` and `AccrualService` against stored balances. Every
//! write is a read-compute-CAS cycle retried up to the configured bound;
//! audit rows are appended only after the write lands.

use std::sync::Arc;

use chrono::NaiveDate;
use furlough_core::Clock;
use furlough_core::balance::{
    AccrualPlan, AccrualService, AdjustmentInput, BalanceKey, EmployeeLeaveBalance, LeaveAdjustment,
    LedgerError, LedgerService, Reservation, RolloverPlan,
};
use furlough_core::policy::{EmployeeProfile, LeaveType, VacationPackage};
use rust_decimal::Decimal;

use super::adjustment::AdjustmentLog;
use crate::versioned::VersionedMap;

/// Stored balances plus their audit log.
pub struct BalanceRepository {
    balances: VersionedMap<EmployeeLeaveBalance>,
    log: AdjustmentLog,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl BalanceRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, max_retries: u32) -> Self {
        Self {
            balances: VersionedMap::new(),
            log: AdjustmentLog::new(),
            clock,
            max_retries,
        }
    }

    /// Returns the stored balance.
    pub fn get(&self, key: &BalanceKey) -> Option<EmployeeLeaveBalance> {
        self.balances.get(key)
    }

    /// Returns the stored balance, opening an empty one if needed.
    pub fn get_or_create(&self, key: BalanceKey) -> EmployeeLeaveBalance {
        let now = self.clock.now();
        self.balances
            .get_or_insert_with(key, || EmployeeLeaveBalance::new(key, now))
    }

    /// Every stored balance matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&EmployeeLeaveBalance) -> bool) -> Vec<EmployeeLeaveBalance> {
        self.balances.filter(predicate)
    }

    /// Adjustment history of one balance, newest last.
    pub fn history(&self, key: &BalanceKey) -> Vec<LeaveAdjustment> {
        self.log.history(key)
    }

    /// The audit log.
    pub fn log(&self) -> &AdjustmentLog {
        &self.log
    }

    /// Reserves `requested` days.
    pub fn reserve(
        &self,
        key: BalanceKey,
        requested: Decimal,
        allow_unpaid_excess: bool,
    ) -> Result<Reservation, LedgerError> {
        self.reserve_checked(key, requested, allow_unpaid_excess, |_| Ok::<(), LedgerError>(()))
    }

    /// Reserves `requested` days if `guard` accepts the computed reservation.
    ///
    /// The guard sees the reservation against the balance it was computed
    /// from, so checks such as the annual cap hold for the written state.
    pub fn reserve_checked<E>(
        &self,
        key: BalanceKey,
        requested: Decimal,
        allow_unpaid_excess: bool,
        guard: impl Fn(&Reservation) -> Result<(), E>,
    ) -> Result<Reservation, E>
    where
        E: From<LedgerError>,
    {
        self.get_or_create(key);
        let (stored, excess) = self.update(key, |current| {
            let reservation = LedgerService::reserve(current, requested, allow_unpaid_excess, self.clock.now())?;
            guard(&reservation)?;
            Ok::<_, E>((reservation.balance, reservation.excess))
        })?;
        tracing::debug!(
            key = %key,
            paid_days = %excess.paid_days,
            unpaid_days = %excess.unpaid_days,
            "Days reserved"
        );
        Ok(Reservation {
            balance: stored,
            excess,
        })
    }

    /// Moves `paid_days` from pending to taken.
    pub fn commit(&self, key: BalanceKey, paid_days: Decimal) -> Result<EmployeeLeaveBalance, LedgerError> {
        let (stored, ()) = self.update(key, |current| {
            Ok::<_, LedgerError>((LedgerService::commit(current, paid_days, self.clock.now())?, ()))
        })?;
        tracing::debug!(key = %key, days = %paid_days, "Reservation committed");
        Ok(stored)
    }

    /// Drops a reservation of `paid_days`.
    pub fn release(&self, key: BalanceKey, paid_days: Decimal) -> Result<EmployeeLeaveBalance, LedgerError> {
        let (stored, ()) = self.update(key, |current| {
            Ok::<_, LedgerError>((LedgerService::release(current, paid_days, self.clock.now())?, ()))
        })?;
        tracing::debug!(key = %key, days = %paid_days, "Reservation released");
        Ok(stored)
    }

    /// Moves `paid_days` from taken back to pending after a lost request write.
    pub fn reopen(&self, key: BalanceKey, paid_days: Decimal) -> Result<EmployeeLeaveBalance, LedgerError> {
        let (stored, ()) = self.update(key, |current| {
            Ok::<_, LedgerError>((LedgerService::reopen(current, paid_days, self.clock.now())?, ()))
        })?;
        tracing::debug!(key = %key, days = %paid_days, "Commit reversed");
        Ok(stored)
    }

    /// Puts a released reservation back after a lost request write.
    pub fn restore(&self, key: BalanceKey, paid_days: Decimal) -> Result<EmployeeLeaveBalance, LedgerError> {
        let (stored, ()) = self.update(key, |current| {
            Ok::<_, LedgerError>((LedgerService::restore(current, paid_days, self.clock.now())?, ()))
        })?;
        tracing::debug!(key = %key, days = %paid_days, "Release reversed");
        Ok(stored)
    }

    /// Applies a direct adjustment and records its audit row.
    pub fn adjust(
        &self,
        key: BalanceKey,
        input: &AdjustmentInput,
        leave_type: &LeaveType,
    ) -> Result<(EmployeeLeaveBalance, LeaveAdjustment), LedgerError> {
        self.get_or_create(key);
        let (stored, row) = self.update(key, |current| {
            LedgerService::adjust(current, input, leave_type, self.clock.now())
        })?;
        tracing::info!(
            key = %key,
            adjustment_type = ?input.adjustment_type,
            delta = %input.delta,
            performed_by = ?input.performed_by,
            "Balance adjusted"
        );
        self.log.append(row.clone());
        Ok((stored, row))
    }

    /// Credits the accrual periods due by `today`.
    pub fn accrue(
        &self,
        key: BalanceKey,
        package: &VacationPackage,
        employee: &EmployeeProfile,
        leave_type: &LeaveType,
        today: NaiveDate,
    ) -> Result<Option<AccrualPlan>, LedgerError> {
        self.get_or_create(key);
        let (_, outcome) = self.update(key, |current| {
            let Some(plan) = AccrualService::plan_accrual(current, package, employee, today) else {
                return Ok::<_, LedgerError>((current.clone(), None));
            };
            let (next, row) = AccrualService::apply_accrual(current, &plan, leave_type, self.clock.now())?;
            Ok((next, Some((plan, row))))
        })?;
        let Some((plan, row)) = outcome else {
            return Ok(None);
        };
        if let Some(row) = row {
            self.log.append(row);
        }
        Ok(Some(plan))
    }

    /// Closes the leave year of `prior_key` and opens the next one.
    ///
    /// The next year is credited first and stamped with `carried_from`, then
    /// the prior record is stamped with `rolled_over_into`. A run that fails
    /// between the two writes is finished by the next run without crediting
    /// twice. Returns `None` when nothing is due or another run closed the
    /// prior year first.
    pub fn rollover(
        &self,
        prior_key: BalanceKey,
        leave_type: &LeaveType,
        package: Option<&VacationPackage>,
        employee: &EmployeeProfile,
        today: NaiveDate,
    ) -> Result<Option<RolloverPlan>, LedgerError> {
        let prior = self.balances.get(&prior_key).ok_or(LedgerError::BalanceNotFound(prior_key))?;
        let Some(plan) = AccrualService::plan_rollover(&prior, leave_type, package, employee, today) else {
            return Ok(None);
        };

        self.get_or_create(plan.to);
        let (_, row) = self.update(plan.to, |current| {
            let (_, opened, row) = AccrualService::apply_rollover(&prior, current, &plan, leave_type, self.clock.now())?;
            Ok::<_, LedgerError>((opened, row))
        })?;
        if let Some(row) = row {
            self.log.append(row);
        }

        let (_, closed) = self.update(prior_key, |current| {
            if current.rolled_over_into.is_some() {
                return Ok::<_, LedgerError>((current.clone(), false));
            }
            let mut closed = current.clone();
            closed.rolled_over_into = Some(plan.to.year);
            closed.updated_at = self.clock.now();
            Ok((closed, true))
        })?;
        if !closed {
            return Ok(None);
        }
        tracing::info!(
            from = %plan.from,
            to = %plan.to,
            carry = %plan.carry,
            expires_on = ?plan.expires_on,
            "Leave year rolled over"
        );
        Ok(Some(plan))
    }

    /// Expires unconsumed carryover once its date has passed.
    ///
    /// Returns the days expired, or `None` when nothing was due.
    pub fn expire_carry_over(
        &self,
        key: BalanceKey,
        leave_type: &LeaveType,
        today: NaiveDate,
    ) -> Result<Option<Decimal>, LedgerError> {
        let (_, outcome) = self.update(key, |current| {
            let Some(amount) = AccrualService::plan_expiry(current, today) else {
                return Ok::<_, LedgerError>((current.clone(), None));
            };
            let (next, row) = AccrualService::apply_expiry(current, amount, leave_type, self.clock.now())?;
            Ok((next, Some((amount, row))))
        })?;
        let Some((amount, row)) = outcome else {
            return Ok(None);
        };
        if let Some(row) = row {
            self.log.append(row);
        }
        tracing::info!(key = %key, days = %amount, "Carryover expired");
        Ok(Some(amount))
    }

    /// Read-compute-CAS with bounded retries.
    ///
    /// `step` sees the current record; returning an unchanged clone skips
    /// the write.
    fn update<R, E>(
        &self,
        key: BalanceKey,
        mut step: impl FnMut(&EmployeeLeaveBalance) -> Result<(EmployeeLeaveBalance, R), E>,
    ) -> Result<(EmployeeLeaveBalance, R), E>
    where
        E: From<LedgerError>,
    {
        for attempt in 0..=self.max_retries {
            let current = self.balances.get(&key).ok_or(LedgerError::BalanceNotFound(key))?;
            let (next, out) = step(&current)?;
            if next == current {
                return Ok((current, out));
            }
            match self.balances.compare_and_swap(next) {
                Ok(stored) => return Ok((stored, out)),
                Err(e) if e.is_conflict() => {
                    tracing::debug!(key = %key, attempt, "Balance write conflict, retrying");
                }
                Err(e) => return Err(LedgerError::Storage(e.to_string()).into()),
            }
        }
        tracing::warn!(key = %key, retries = self.max_retries, "Balance write retries exhausted");
        Err(LedgerError::ConcurrentModification(key).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use furlough_core::ManualClock;
    use furlough_core::balance::AdjustmentType;
    use furlough_core::policy::{AccrualFrequency, AccrualRules, CarryOverRules, Eligibility, ResetCriterion};
    use furlough_shared::types::{DepartmentId, EmployeeId, LeaveTypeId, VacationPackageId};
    use rust_decimal_macros::dec;

    fn repo() -> BalanceRepository {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
        BalanceRepository::new(clock, 5)
    }

    fn leave_type(id: LeaveTypeId) -> LeaveType {
        LeaveType {
            id,
            code: "ANNUAL".to_string(),
            name: "Annual leave".to_string(),
            is_paid: true,
            allow_unpaid_excess: true,
            max_days_per_request: None,
            max_days_per_year: None,
            document_required_after_days: None,
            carry_over_eligible: true,
            encashment_eligible: false,
            payroll_code: "AL".to_string(),
            is_active: true,
        }
    }

    fn employee() -> EmployeeProfile {
        EmployeeProfile {
            id: EmployeeId::new(),
            department_id: DepartmentId::new(),
            position: "Engineer".to_string(),
            grade: "G5".to_string(),
            contract_type: "permanent".to_string(),
            country_code: "DE".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            work_start_date: None,
            is_suspended: false,
            on_unpaid_leave: false,
        }
    }

    fn package(leave_type_id: LeaveTypeId) -> VacationPackage {
        VacationPackage {
            id: VacationPackageId::new(),
            name: "Standard".to_string(),
            leave_type_id,
            priority: 1,
            is_active: true,
            eligibility: Eligibility::default(),
            accrual: AccrualRules {
                frequency: AccrualFrequency::Yearly,
                rate: dec!(21),
                pause_on_unpaid_leave: true,
                pause_on_suspension: true,
            },
            carry_over: CarryOverRules {
                max_days: dec!(5),
                expiry_months: 3,
                allow_unlimited: false,
            },
            reset: ResetCriterion::CalendarYear,
        }
    }

    fn credit(repo: &BalanceRepository, key: BalanceKey, days: Decimal) {
        let input = AdjustmentInput {
            adjustment_type: AdjustmentType::Manual,
            delta: days,
            reason: "Opening balance".to_string(),
            performed_by: Some(EmployeeId::new()),
        };
        repo.adjust(key, &input, &leave_type(key.leave_type_id)).unwrap();
    }

    #[test]
    fn test_reserve_commit_roundtrip_through_store() {
        let repo = repo();
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        credit(&repo, key, dec!(21));

        let reservation = repo.reserve(key, dec!(10), true).unwrap();
        assert_eq!(reservation.balance.pending, dec!(10));
        assert_eq!(reservation.balance.remaining(), dec!(11));

        let committed = repo.commit(key, dec!(10)).unwrap();
        assert_eq!(committed.taken, dec!(10));
        assert_eq!(committed.pending, Decimal::ZERO);
        assert_eq!(committed.remaining(), dec!(11));
        assert_eq!(committed.version, 4);
    }

    #[test]
    fn test_guard_rejection_leaves_balance_untouched() {
        let repo = repo();
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        credit(&repo, key, dec!(5));
        let before = repo.get(&key).unwrap();

        let result = repo.reserve_checked(key, dec!(3), false, |r| {
            if r.excess.paid_days > dec!(2) {
                Err(LedgerError::InvariantViolation("cap".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(repo.get(&key).unwrap(), before);
    }

    #[test]
    fn test_release_more_than_pending_fails() {
        let repo = repo();
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        credit(&repo, key, dec!(5));
        repo.reserve(key, dec!(2), false).unwrap();
        assert!(matches!(
            repo.release(key, dec!(3)),
            Err(LedgerError::ReservationUnderflow { .. })
        ));
    }

    #[test]
    fn test_commit_on_missing_balance() {
        let repo = repo();
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        assert!(matches!(repo.commit(key, dec!(1)), Err(LedgerError::BalanceNotFound(_))));
    }

    #[test]
    fn test_adjustments_logged_in_order() {
        let repo = repo();
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        credit(&repo, key, dec!(5));
        credit(&repo, key, dec!(-1.5));

        let history = repo.history(&key);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].before.remaining, dec!(5));
        assert_eq!(history[1].after.remaining, dec!(3.5));
    }

    #[test]
    fn test_failed_adjustment_is_not_logged() {
        let repo = repo();
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        let input = AdjustmentInput {
            adjustment_type: AdjustmentType::Manual,
            delta: dec!(2),
            reason: "   ".to_string(),
            performed_by: None,
        };
        assert!(matches!(
            repo.adjust(key, &input, &leave_type(key.leave_type_id)),
            Err(LedgerError::AdjustmentReasonRequired)
        ));
        assert!(repo.history(&key).is_empty());
    }

    #[test]
    fn test_unfinished_rollover_completes_without_second_credit() {
        let repo = repo();
        let emp = employee();
        let lt = leave_type(LeaveTypeId::new());
        let pkg = package(lt.id);
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let prior_key = BalanceKey::new(emp.id, lt.id, 2024);
        credit(&repo, prior_key, dec!(8));

        let plan = repo.rollover(prior_key, &lt, Some(&pkg), &emp, today).unwrap().unwrap();
        assert_eq!(plan.carry, dec!(5));

        // Prior year left open, as after a lost second write.
        let mut open = repo.get(&prior_key).unwrap();
        open.rolled_over_into = None;
        repo.balances.compare_and_swap(open).unwrap();

        assert!(repo.rollover(prior_key, &lt, Some(&pkg), &emp, today).unwrap().is_some());
        let next = repo.get(&plan.to).unwrap();
        assert_eq!(next.carried_over, dec!(5));
        assert_eq!(next.carried_from, Some(2024));
        let carry_rows = repo
            .history(&plan.to)
            .iter()
            .filter(|row| row.adjustment_type == AdjustmentType::CarryOver)
            .count();
        assert_eq!(carry_rows, 1);
        assert_eq!(repo.get(&prior_key).unwrap().rolled_over_into, Some(2025));
        assert!(repo.rollover(prior_key, &lt, Some(&pkg), &emp, today).unwrap().is_none());
    }
}
