//! Vacation packages: who is eligible, how days accrue, what carries over,
//! and when the leave year resets.

use chrono::{Datelike, Months, NaiveDate};
use furlough_shared::types::{DepartmentId, LeaveTypeId, VacationPackageId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::employee::EmployeeProfile;

/// How often the accrual rate is credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualFrequency {
    /// Once per calendar month.
    Monthly,
    /// Once per calendar quarter.
    Quarterly,
    /// Once per leave year, at its start.
    Yearly,
}

impl AccrualFrequency {
    /// First day of the accrual period containing `date`.
    ///
    /// Yearly periods coincide with the leave year, so `leave_year_start`
    /// is the only yearly period start.
    #[must_use]
    pub fn period_start(self, date: NaiveDate, leave_year_start: NaiveDate) -> NaiveDate {
        match self {
            Self::Monthly => first_of_month(date.year(), date.month()).unwrap_or(date),
            Self::Quarterly => {
                let quarter_month = (date.month0() / 3) * 3 + 1;
                first_of_month(date.year(), quarter_month).unwrap_or(date)
            }
            Self::Yearly => leave_year_start,
        }
    }

    /// Start of the period following the one starting at `period_start`.
    #[must_use]
    pub fn next_period(self, period_start: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        };
        period_start.checked_add_months(Months::new(months))
    }
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Accrual settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualRules {
    /// Crediting frequency.
    pub frequency: AccrualFrequency,
    /// Days credited per period.
    pub rate: Decimal,
    /// Stop accruing while the employee is on unpaid leave.
    pub pause_on_unpaid_leave: bool,
    /// Stop accruing while the employee is suspended.
    pub pause_on_suspension: bool,
}

impl AccrualRules {
    /// Returns true if accrual is paused for `employee`.
    #[must_use]
    pub fn is_paused_for(&self, employee: &EmployeeProfile) -> bool {
        (self.pause_on_unpaid_leave && employee.on_unpaid_leave)
            || (self.pause_on_suspension && employee.is_suspended)
    }
}

/// Carryover settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryOverRules {
    /// Cap on days moved into the next leave year.
    pub max_days: Decimal,
    /// Months after the new leave year starts until carried days expire (0 = never).
    pub expiry_months: u32,
    /// Ignore `max_days`.
    pub allow_unlimited: bool,
}

impl CarryOverRules {
    /// Days carried given the prior year's `remaining`.
    #[must_use]
    pub fn carry_amount(&self, remaining: Decimal) -> Decimal {
        let available = remaining.max(Decimal::ZERO);
        if self.allow_unlimited {
            available
        } else {
            available.min(self.max_days.max(Decimal::ZERO))
        }
    }
}

/// What anchors the employee's leave year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetCriterion {
    /// Anniversary of the hire date.
    HireDate,
    /// Anniversary of the work start date (falls back to the hire date).
    WorkStartDate,
    /// January 1st.
    #[default]
    CalendarYear,
}

impl ResetCriterion {
    fn anchor(self, employee: &EmployeeProfile) -> Option<NaiveDate> {
        match self {
            Self::HireDate => Some(employee.hire_date),
            Self::WorkStartDate => Some(employee.work_start_date.unwrap_or(employee.hire_date)),
            Self::CalendarYear => None,
        }
    }

    /// First day of the leave year that began in calendar `year`.
    #[must_use]
    pub fn leave_year_start(self, employee: &EmployeeProfile, year: i32) -> NaiveDate {
        match self.anchor(employee) {
            Some(anchor) => anniversary(anchor, year),
            None => NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(employee.hire_date),
        }
    }

    /// Calendar year in which the leave year containing `date` began.
    ///
    /// This is the `year` component of balance keys.
    #[must_use]
    pub fn leave_year_of(self, employee: &EmployeeProfile, date: NaiveDate) -> i32 {
        match self.anchor(employee) {
            Some(anchor) if date < anniversary(anchor, date.year()) => date.year() - 1,
            _ => date.year(),
        }
    }
}

/// `anchor` moved to `year`; Feb 29 anchors fall on Feb 28 in common years.
fn anniversary(anchor: NaiveDate, year: i32) -> NaiveDate {
    anchor
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, anchor.month(), 28))
        .unwrap_or(anchor)
}

/// Who a package applies to. Empty lists mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Minimum months of service.
    pub min_tenure_months: u32,
    /// Allowed contract types.
    pub contract_types: Vec<String>,
    /// Allowed grades.
    pub grades: Vec<String>,
    /// Allowed departments.
    pub department_ids: Vec<DepartmentId>,
}

impl Eligibility {
    /// Returns true if `employee` qualifies on `on`.
    #[must_use]
    pub fn matches(&self, employee: &EmployeeProfile, on: NaiveDate) -> bool {
        employee.tenure_months(on) >= self.min_tenure_months
            && (self.contract_types.is_empty()
                || self
                    .contract_types
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&employee.contract_type)))
            && (self.grades.is_empty() || self.grades.contains(&employee.grade))
            && (self.department_ids.is_empty()
                || self.department_ids.contains(&employee.department_id))
    }
}

/// Accrual and carryover policy for one leave type and employee cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationPackage {
    /// Identifier.
    pub id: VacationPackageId,
    /// Display name.
    pub name: String,
    /// Leave type the package credits.
    pub leave_type_id: LeaveTypeId,
    /// Selection order among matching packages (lower wins).
    pub priority: i16,
    /// Inactive packages are ignored.
    pub is_active: bool,
    /// Cohort predicate.
    pub eligibility: Eligibility,
    /// Accrual rules.
    pub accrual: AccrualRules,
    /// Carryover rules.
    pub carry_over: CarryOverRules,
    /// Leave-year anchor.
    pub reset: ResetCriterion,
}

impl VacationPackage {
    /// Selects the package governing `employee` for `leave_type_id` on `on`.
    ///
    /// When several active packages match, the one with the lowest priority
    /// value wins.
    #[must_use]
    pub fn select<'a>(
        packages: &'a [VacationPackage],
        employee: &EmployeeProfile,
        leave_type_id: LeaveTypeId,
        on: NaiveDate,
    ) -> Option<&'a VacationPackage> {
        packages
            .iter()
            .filter(|p| p.is_active && p.leave_type_id == leave_type_id)
            .filter(|p| p.eligibility.matches(employee, on))
            .min_by_key(|p| p.priority)
    }
}
