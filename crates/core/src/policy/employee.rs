//! Read model of the employee directory.

use chrono::{Datelike, NaiveDate};
use furlough_shared::types::{DepartmentId, EmployeeId};
use serde::{Deserialize, Serialize};

/// What the leave subsystem needs to know about an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    /// Identifier.
    pub id: EmployeeId,
    /// Department.
    pub department_id: DepartmentId,
    /// Position title, used for position-scoped team conflicts.
    pub position: String,
    /// Salary grade.
    pub grade: String,
    /// Contract type (permanent, fixed_term, ...).
    pub contract_type: String,
    /// ISO country code for the holiday calendar.
    pub country_code: String,
    /// Hire date.
    pub hire_date: NaiveDate,
    /// Date work actually started, when it differs from the hire date.
    pub work_start_date: Option<NaiveDate>,
    /// Suspended employees may have accrual paused.
    pub is_suspended: bool,
    /// Employees on unpaid leave may have accrual paused.
    pub on_unpaid_leave: bool,
}

impl EmployeeProfile {
    /// Whole months of service on `on`.
    #[must_use]
    pub fn tenure_months(&self, on: NaiveDate) -> u32 {
        if on < self.hire_date {
            return 0;
        }
        let years = on.year() - self.hire_date.year();
        let months = on.month().cast_signed() - self.hire_date.month().cast_signed();
        let mut total = years * 12 + months;
        if on.day() < self.hire_date.day() {
            total -= 1;
        }
        u32::try_from(total).unwrap_or(0)
    }
}
