//! Leave types.

use furlough_shared::types::LeaveTypeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A kind of leave (annual, sick, unpaid, ...).
///
/// Immutable once balances reference it; retire with `is_active = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
    /// Identifier.
    pub id: LeaveTypeId,
    /// Short code (e.g. "ANNUAL").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Whether days of this type are paid and drawn from a balance.
    pub is_paid: bool,
    /// Whether days beyond the balance convert to unpaid.
    pub allow_unpaid_excess: bool,
    /// Upper bound on one request.
    pub max_days_per_request: Option<Decimal>,
    /// Upper bound on paid days per leave year.
    pub max_days_per_year: Option<Decimal>,
    /// Requests longer than this must attach a document.
    pub document_required_after_days: Option<Decimal>,
    /// Unused days may roll into the next leave year.
    pub carry_over_eligible: bool,
    /// Unused days may be paid out.
    pub encashment_eligible: bool,
    /// Code handed to payroll.
    pub payroll_code: String,
    /// Retired types accept no new requests.
    pub is_active: bool,
}

impl LeaveType {
    /// Returns true if a request of `total_days` needs a supporting document.
    #[must_use]
    pub fn requires_document(&self, total_days: Decimal) -> bool {
        self.document_required_after_days
            .is_some_and(|threshold| total_days > threshold)
    }
}
