//! Property-based tests for AccrualService.
//!
//! - Property 4: carryover never exceeds the cap unless unlimited
//! - Property 5: expiry never drives a bucket negative

use chrono::{NaiveDate, Utc};
use furlough_shared::types::{DepartmentId, EmployeeId, LeaveTypeId, VacationPackageId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::accrual::AccrualService;
use super::types::{BalanceKey, EmployeeLeaveBalance};
use crate::policy::{
    AccrualFrequency, AccrualRules, CarryOverRules, Eligibility, EmployeeProfile, LeaveType,
    ResetCriterion, VacationPackage,
};

fn half_days(max_halves: i64) -> impl Strategy<Value = Decimal> {
    (0i64..=max_halves).prop_map(|halves| Decimal::new(halves * 5, 1))
}

fn employee() -> EmployeeProfile {
    EmployeeProfile {
        id: EmployeeId::new(),
        department_id: DepartmentId::new(),
        position: "Engineer".to_string(),
        grade: "G5".to_string(),
        contract_type: "permanent".to_string(),
        country_code: "ID".to_string(),
        hire_date: NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
        work_start_date: None,
        is_suspended: false,
        on_unpaid_leave: false,
    }
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
        encashment_eligible: false,
        payroll_code: "AL".to_string(),
        is_active: true,
    }
}

fn package(leave_type_id: LeaveTypeId, max_days: Decimal, allow_unlimited: bool) -> VacationPackage {
    VacationPackage {
        id: VacationPackageId::new(),
        name: "Standard".to_string(),
        leave_type_id,
        priority: 0,
        is_active: true,
        eligibility: Eligibility::default(),
        accrual: AccrualRules {
            frequency: AccrualFrequency::Monthly,
            rate: Decimal::new(175, 2),
            pause_on_unpaid_leave: false,
            pause_on_suspension: false,
        },
        carry_over: CarryOverRules {
            max_days,
            expiry_months: 3,
            allow_unlimited,
        },
        reset: ResetCriterion::CalendarYear,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 4: carry <= cap, carry <= max(remaining, 0).
    #[test]
    fn prop_carryover_respects_cap(
        accrued in half_days(60),
        taken in half_days(60),
        cap in half_days(20),
        allow_unlimited in any::<bool>(),
    ) {
        let emp = employee();
        let lt = leave_type();
        let pkg = package(lt.id, cap, allow_unlimited);
        let mut prior = EmployeeLeaveBalance::new(BalanceKey::new(emp.id, lt.id, 2024), Utc::now());
        prior.accrued = accrued;
        prior.taken = taken;
        prior.recompute();

        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let plan = AccrualService::plan_rollover(&prior, &lt, Some(&pkg), &emp, today).unwrap();
        prop_assert!(plan.carry <= prior.remaining().max(Decimal::ZERO));
        if !allow_unlimited {
            prop_assert!(plan.carry <= cap);
        }

        let next = EmployeeLeaveBalance::new(plan.to, Utc::now());
        let (_, opened, _) = AccrualService::apply_rollover(&prior, &next, &plan, &lt, Utc::now()).unwrap();
        prop_assert_eq!(opened.carried_over, plan.carry);
        prop_assert!(opened.check_invariants().is_ok());
    }

    /// Property 5: expiring carryover keeps every bucket non-negative.
    #[test]
    fn prop_expiry_keeps_buckets_non_negative(
        carried in half_days(20),
        accrued in half_days(40),
        taken in half_days(60),
    ) {
        let emp = employee();
        let lt = leave_type();
        let mut b = EmployeeLeaveBalance::new(BalanceKey::new(emp.id, lt.id, 2025), Utc::now());
        b.carried_over = carried;
        b.accrued = accrued;
        b.taken = taken;
        b.recompute();
        b.carry_over_expires_on = NaiveDate::from_ymd_opt(2025, 4, 1);

        let today = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let amount = AccrualService::plan_expiry(&b, today).unwrap();
        let (next, _) = AccrualService::apply_expiry(&b, amount, &lt, Utc::now()).unwrap();
        prop_assert!(next.check_invariants().is_ok());
        prop_assert!(next.remaining() >= Decimal::ZERO || b.remaining() < Decimal::ZERO);
        prop_assert!(next.carry_over_expired);
    }
}
