//! In-process collaborator implementations.
//!
//! `StaticOrgChart` answers role lookups from a table; the tracing
//! implementations log instead of delivering; the recording ones keep what
//! they were given for inspection and can be told to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use furlough_core::collab::{
    CollaboratorError, DownstreamSync, NotificationEvent, NotificationSink, OrgHierarchy, SyncSignal, SyncTarget,
};
use furlough_core::policy::ApproverRole;
use furlough_shared::types::{EmployeeId, LeaveRequestId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// One row of the org chart: who fills `role` for `employee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Employee being approved for.
    pub employee_id: EmployeeId,
    /// Role.
    pub role: ApproverRole,
    /// Who fills it.
    pub approver_id: EmployeeId,
}

/// Org hierarchy backed by a role table.
#[derive(Debug, Default)]
pub struct StaticOrgChart {
    roles: RwLock<HashMap<(EmployeeId, ApproverRole), EmployeeId>>,
}

impl StaticOrgChart {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chart from assignments.
    #[must_use]
    pub fn from_assignments(assignments: &[RoleAssignment]) -> Self {
        let chart = Self::new();
        for a in assignments {
            chart.assign(a.employee_id, a.role, a.approver_id);
        }
        chart
    }

    /// Sets who fills `role` for `employee_id`.
    pub fn assign(&self, employee_id: EmployeeId, role: ApproverRole, approver_id: EmployeeId) {
        self.roles.write().insert((employee_id, role), approver_id);
    }

    /// Removes an assignment.
    pub fn unassign(&self, employee_id: EmployeeId, role: ApproverRole) {
        self.roles.write().remove(&(employee_id, role));
    }
}

impl OrgHierarchy for StaticOrgChart {
    fn resolve_approver(&self, employee_id: EmployeeId, role: ApproverRole) -> Option<EmployeeId> {
        self.roles.read().get(&(employee_id, role)).copied()
    }
}

/// Logs notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(
        &self,
        event: NotificationEvent,
        request_id: LeaveRequestId,
        recipients: &[EmployeeId],
    ) -> Result<(), CollaboratorError> {
        tracing::info!(?event, request_id = %request_id, recipients = recipients.len(), "Notification");
        Ok(())
    }
}

/// Logs downstream publications.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSync;

impl DownstreamSync for TracingSync {
    fn publish(&self, target: SyncTarget, signal: &SyncSignal) -> Result<(), CollaboratorError> {
        tracing::info!(
            ?target,
            request_id = %signal.request_id,
            paid_days = %signal.paid_days,
            unpaid_days = %signal.unpaid_days,
            pay_code = %signal.pay_code,
            "Published approved leave"
        );
        Ok(())
    }
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Event.
    pub event: NotificationEvent,
    /// Request.
    pub request_id: LeaveRequestId,
    /// Recipients.
    pub recipients: Vec<EmployeeId>,
}

/// Keeps notifications in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delivery fail.
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything delivered so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().clone()
    }

    /// Deliveries of `event`.
    pub fn sent_for(&self, event: NotificationEvent) -> Vec<SentNotification> {
        self.sent.lock().iter().filter(|n| n.event == event).cloned().collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(
        &self,
        event: NotificationEvent,
        request_id: LeaveRequestId,
        recipients: &[EmployeeId],
    ) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError {
                collaborator: "notifier",
                message: "delivery refused".to_string(),
            });
        }
        self.sent.lock().push(SentNotification {
            event,
            request_id,
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}

/// Keeps published signals in memory.
#[derive(Debug, Default)]
pub struct RecordingSync {
    published: Mutex<Vec<(SyncTarget, SyncSignal)>>,
    failing: AtomicBool,
}

impl RecordingSync {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later publication fail.
    pub fn fail_publications(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything published so far.
    pub fn published(&self) -> Vec<(SyncTarget, SyncSignal)> {
        self.published.lock().clone()
    }
}

impl DownstreamSync for RecordingSync {
    fn publish(&self, target: SyncTarget, signal: &SyncSignal) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError {
                collaborator: "sync",
                message: format!("{target:?} unavailable"),
            });
        }
        self.published.lock().push((target, signal.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_chart_assignments() {
        let employee = EmployeeId::new();
        let manager = EmployeeId::new();
        let chart = StaticOrgChart::from_assignments(&[RoleAssignment {
            employee_id: employee,
            role: ApproverRole::DirectManager,
            approver_id: manager,
        }]);
        assert_eq!(chart.resolve_approver(employee, ApproverRole::DirectManager), Some(manager));
        assert_eq!(chart.resolve_approver(employee, ApproverRole::HrOfficer), None);

        chart.unassign(employee, ApproverRole::DirectManager);
        assert_eq!(chart.resolve_approver(employee, ApproverRole::DirectManager), None);
    }

    #[test]
    fn test_recording_notifier_failure_mode() {
        let notifier = RecordingNotifier::new();
        let request = LeaveRequestId::new();
        notifier.notify(NotificationEvent::Submitted, request, &[EmployeeId::new()]).unwrap();
        notifier.fail_deliveries(true);
        assert!(notifier.notify(NotificationEvent::Approved, request, &[]).is_err());
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent_for(NotificationEvent::Submitted).len(), 1);
    }
}
