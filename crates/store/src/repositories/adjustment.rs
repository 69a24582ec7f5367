//! Append-only audit log of balance adjustments.

use dashmap::DashMap;
use furlough_core::balance::{BalanceKey, LeaveAdjustment};
use furlough_shared::types::EmployeeId;

/// Adjustment rows per balance key, oldest first.
#[derive(Debug, Default)]
pub struct AdjustmentLog {
    rows: DashMap<BalanceKey, Vec<LeaveAdjustment>>,
}

impl AdjustmentLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row. Rows are never edited or removed.
    pub fn append(&self, row: LeaveAdjustment) {
        tracing::debug!(
            key = %row.key,
            adjustment_type = ?row.adjustment_type,
            delta = %row.delta,
            "Adjustment recorded"
        );
        self.rows.entry(row.key).or_default().push(row);
    }

    /// History of one balance, newest last.
    pub fn history(&self, key: &BalanceKey) -> Vec<LeaveAdjustment> {
        self.rows.get(key).map(|r| r.value().clone()).unwrap_or_default()
    }

    /// Every row for an employee across leave types and years.
    pub fn for_employee(&self, employee_id: EmployeeId) -> Vec<LeaveAdjustment> {
        let mut rows: Vec<LeaveAdjustment> = self
            .rows
            .iter()
            .filter(|r| r.key().employee_id == employee_id)
            .flat_map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        rows
    }
}
