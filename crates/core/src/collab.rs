//! Interfaces of the external collaborators this core consumes.
//!
//! The org hierarchy, delegation lookup, holiday calendar, notification
//! delivery and payroll/time-management sync all live outside this
//! subsystem. Only their call shapes are fixed here, plus a static
//! working-day calendar good enough for embedding and tests.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};
use furlough_shared::types::{DateRange, EmployeeId, LeaveRequestId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{ApproverRole, ManagerDelegation};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, Error)]
#[error("{collaborator} failed: {message}")]
pub struct CollaboratorError {
    /// Which collaborator failed.
    pub collaborator: &'static str,
    /// What it reported.
    pub message: String,
}

/// Resolves a role relative to an employee into a concrete person.
pub trait OrgHierarchy: Send + Sync {
    /// Returns who holds `role` for `employee_id`, if anyone.
    fn resolve_approver(&self, employee_id: EmployeeId, role: ApproverRole) -> Option<EmployeeId>;
}

/// Looks up manager delegations in force on a date.
pub trait DelegationLookup: Send + Sync {
    /// Returns the delegation in force for `manager_id` on `on`, if any.
    fn active_delegate(&self, manager_id: EmployeeId, on: NaiveDate) -> Option<ManagerDelegation>;
}

/// Counts working days.
pub trait HolidayCalendar: Send + Sync {
    /// Working days in `range` for `country_code`, weekends and holidays excluded.
    fn net_working_days(&self, range: DateRange, country_code: &str) -> u32;
}

/// Events that may trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Request submitted; the first approver is told.
    Submitted,
    /// An intermediate step approved; the next approver is told.
    StepApproved,
    /// Final approval; the requester is told.
    Approved,
    /// Rejection; the requester is told.
    Rejected,
    /// An overdue step changed hands; the new approver is told.
    Escalated,
    /// Request cancelled; the active approver is told.
    Cancelled,
    /// A rejection was overridden; the requester is told.
    Overridden,
}

/// Fire-and-forget notification delivery.
pub trait NotificationSink: Send + Sync {
    /// Delivers `event` about `request_id` to `recipients`.
    fn notify(
        &self,
        event: NotificationEvent,
        request_id: LeaveRequestId,
        recipients: &[EmployeeId],
    ) -> Result<(), CollaboratorError>;
}

/// Downstream systems that consume approved leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTarget {
    /// Payroll.
    Payroll,
    /// Time management / attendance.
    TimeManagement,
}

impl SyncTarget {
    /// All targets an approved request is published to.
    pub const ALL: [Self; 2] = [Self::Payroll, Self::TimeManagement];
}

/// Outbound signal for an approved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSignal {
    /// The approved request.
    pub request_id: LeaveRequestId,
    /// Who is on leave.
    pub employee_id: EmployeeId,
    /// When.
    pub range: DateRange,
    /// Days charged to the balance.
    pub paid_days: Decimal,
    /// Days converted to unpaid.
    pub unpaid_days: Decimal,
    /// Leave type payroll code.
    pub pay_code: String,
}

/// One-way publication to payroll and time management.
pub trait DownstreamSync: Send + Sync {
    /// Publishes `signal` to `target`. Acknowledgment arrives separately.
    fn publish(&self, target: SyncTarget, signal: &SyncSignal) -> Result<(), CollaboratorError>;
}

/// Calendar with fixed weekend days and per-country holiday lists.
#[derive(Debug, Clone)]
pub struct StaticHolidayCalendar {
    weekend_days: Vec<Weekday>,
    holidays: HashMap<String, BTreeSet<NaiveDate>>,
}

impl StaticHolidayCalendar {
    /// Saturday/Sunday weekend, no holidays.
    #[must_use]
    pub fn new() -> Self {
        Self::with_weekend(vec![Weekday::Sat, Weekday::Sun])
    }

    /// Custom weekend days, no holidays.
    #[must_use]
    pub fn with_weekend(weekend_days: Vec<Weekday>) -> Self {
        Self {
            weekend_days,
            holidays: HashMap::new(),
        }
    }

    /// Registers a public holiday for `country_code`.
    #[must_use]
    pub fn with_holiday(mut self, country_code: &str, day: NaiveDate) -> Self {
        self.holidays
            .entry(country_code.to_uppercase())
            .or_default()
            .insert(day);
        self
    }

    fn is_working_day(&self, day: NaiveDate, holidays: Option<&BTreeSet<NaiveDate>>) -> bool {
        !self.weekend_days.contains(&day.weekday()) && holidays.is_none_or(|h| !h.contains(&day))
    }
}

impl Default for StaticHolidayCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl HolidayCalendar for StaticHolidayCalendar {
    fn net_working_days(&self, range: DateRange, country_code: &str) -> u32 {
        let holidays = self.holidays.get(&country_code.to_uppercase());
        let count = range
            .days()
            .filter(|day| self.is_working_day(*day, holidays))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
