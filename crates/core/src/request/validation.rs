//! Validation findings.
//!
//! Failures block a transition and leave no mutation behind; warnings are
//! recorded on the request and returned to the caller.

use chrono::NaiveDate;
use furlough_shared::types::{BlockPeriodId, DateRange, LeaveRequestId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::NewLeaveRequest;
use crate::collab::HolidayCalendar;
use crate::policy::LeaveType;

/// Blocking validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// A required field is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Half days apply to single-day requests only.
    #[error("Half-day requests must cover a single day")]
    HalfDayRequiresSingleDay,

    /// The range contains no working days.
    #[error("Date range {0} contains no working days")]
    NoWorkingDays(DateRange),

    /// Retroactive requests must concern leave already taken.
    #[error("Post-leave request for {0} has not elapsed yet")]
    PostLeaveNotElapsed(DateRange),

    /// The leave type is retired.
    #[error("Leave type {0} is inactive")]
    LeaveTypeInactive(String),

    /// Per-request cap exceeded.
    #[error("Request of {requested} days exceeds the per-request cap of {cap}")]
    ExceedsRequestCap {
        /// Days requested.
        requested: Decimal,
        /// Cap.
        cap: Decimal,
    },

    /// Per-year cap exceeded.
    #[error("Request would bring the year to {total} days, above the annual cap of {cap}")]
    ExceedsAnnualCap {
        /// Taken, pending and new paid days.
        total: Decimal,
        /// Cap.
        cap: Decimal,
    },

    /// A supporting document is required.
    #[error("Requests over {threshold} days need a supporting document")]
    DocumentRequired {
        /// Threshold days.
        threshold: Decimal,
    },

    /// Balance too low and the leave type forbids unpaid excess.
    #[error("Insufficient balance: requested {requested}, remaining {remaining}")]
    InsufficientBalance {
        /// Days requested.
        requested: Decimal,
        /// Days remaining.
        remaining: Decimal,
    },

    /// A block period vetoes the dates.
    #[error("Dates fall in block period '{name}'")]
    BlockedPeriod {
        /// Block period.
        block_id: BlockPeriodId,
        /// Its name.
        name: String,
    },

    /// Rejections need a comment.
    #[error("Rejection comment is required")]
    RejectionCommentRequired,

    /// Cancellations need a reason.
    #[error("Cancellation reason is required")]
    CancellationReasonRequired,

    /// Overrides need a reason.
    #[error("Override reason is required")]
    OverrideReasonRequired,
}

impl ValidationFailure {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::HalfDayRequiresSingleDay => "HALF_DAY_REQUIRES_SINGLE_DAY",
            Self::NoWorkingDays(_) => "NO_WORKING_DAYS",
            Self::PostLeaveNotElapsed(_) => "POST_LEAVE_NOT_ELAPSED",
            Self::LeaveTypeInactive(_) => "LEAVE_TYPE_INACTIVE",
            Self::ExceedsRequestCap { .. } => "EXCEEDS_REQUEST_CAP",
            Self::ExceedsAnnualCap { .. } => "EXCEEDS_ANNUAL_CAP",
            Self::DocumentRequired { .. } => "DOCUMENT_REQUIRED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::BlockedPeriod { .. } => "BLOCKED_PERIOD",
            Self::RejectionCommentRequired => "REJECTION_COMMENT_REQUIRED",
            Self::CancellationReasonRequired => "CANCELLATION_REASON_REQUIRED",
            Self::OverrideReasonRequired => "OVERRIDE_REASON_REQUIRED",
        }
    }
}

/// Non-blocking finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Another booked request of the same employee overlaps.
    Overlap {
        /// The other request.
        request_id: LeaveRequestId,
        /// Its dates.
        range: DateRange,
    },
    /// The team concurrency threshold is exceeded.
    TeamConflict {
        /// Team members on leave at the busiest day.
        concurrent: u32,
        /// Allowed concurrency.
        allowed: u32,
    },
    /// Days beyond the balance were converted to unpaid leave.
    ExcessConvertedToUnpaid {
        /// Days charged to the balance.
        paid_days: Decimal,
        /// Days converted.
        unpaid_days: Decimal,
    },
}

/// Advisory findings recorded on a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Warnings, in detection order.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Appends a warning unless an identical one is recorded.
    pub fn push(&mut self, warning: ValidationWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Stateless input and policy checks run before any reservation.
pub struct RequestValidator;

impl RequestValidator {
    /// Checks required fields and shape.
    pub fn validate_input(input: &NewLeaveRequest, today: NaiveDate) -> Result<(), ValidationFailure> {
        if input.reason.trim().is_empty() {
            return Err(ValidationFailure::MissingField("reason"));
        }
        if input.half_day && input.range.start != input.range.end {
            return Err(ValidationFailure::HalfDayRequiresSingleDay);
        }
        if input.is_post_leave && input.range.end >= today {
            return Err(ValidationFailure::PostLeaveNotElapsed(input.range));
        }
        Ok(())
    }

    /// Working days requested; a half day counts 0.5.
    pub fn total_days(
        range: DateRange,
        half_day: bool,
        calendar: &dyn HolidayCalendar,
        country_code: &str,
    ) -> Result<Decimal, ValidationFailure> {
        let working = calendar.net_working_days(range, country_code);
        if working == 0 {
            return Err(ValidationFailure::NoWorkingDays(range));
        }
        if half_day {
            return Ok(Decimal::new(5, 1));
        }
        Ok(Decimal::from(working))
    }

    /// Leave-type checks that do not depend on the balance.
    pub fn check_leave_type(
        leave_type: &LeaveType,
        total_days: Decimal,
        document_ids: &[String],
    ) -> Result<(), ValidationFailure> {
        if !leave_type.is_active {
            return Err(ValidationFailure::LeaveTypeInactive(leave_type.code.clone()));
        }
        if let Some(cap) = leave_type.max_days_per_request
            && total_days > cap
        {
            return Err(ValidationFailure::ExceedsRequestCap {
                requested: total_days,
                cap,
            });
        }
        if leave_type.requires_document(total_days)
            && document_ids.iter().all(|d| d.trim().is_empty())
        {
            return Err(ValidationFailure::DocumentRequired {
                threshold: leave_type.document_required_after_days.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Annual cap on paid days: `already_used` is taken plus pending.
    pub fn check_annual_cap(
        leave_type: &LeaveType,
        already_used: Decimal,
        paid_days: Decimal,
    ) -> Result<(), ValidationFailure> {
        if let Some(cap) = leave_type.max_days_per_year {
            let total = already_used + paid_days;
            if total > cap {
                return Err(ValidationFailure::ExceedsAnnualCap { total, cap });
            }
        }
        Ok(())
    }
}
