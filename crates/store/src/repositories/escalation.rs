//! Escalation scan over open requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use furlough_core::collab::{NotificationSink, OrgHierarchy};
use furlough_core::escalation::{EscalationDecision, EscalationPolicy};
use furlough_core::workflow::ChainResolver;
use furlough_shared::types::LeaveRequestId;

use super::catalog::PolicyCatalog;
use super::dispatch;
use super::request::RequestRepository;

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscalationReport {
    /// Steps handed to a new approver.
    pub escalated: Vec<LeaveRequestId>,
    /// Steps flagged without reassignment.
    pub flagged: Vec<LeaveRequestId>,
    /// Open requests with nothing to do.
    pub skipped: usize,
    /// Requests whose escalation failed, with the reason.
    pub failures: Vec<(LeaveRequestId, String)>,
}

/// Periodic escalation of overdue approval steps.
pub struct EscalationRepository {
    requests: Arc<RequestRepository>,
    catalog: Arc<PolicyCatalog>,
    org: Arc<dyn OrgHierarchy>,
    notifier: Arc<dyn NotificationSink>,
    default_escalation_hours: u32,
}

impl EscalationRepository {
    /// Creates the repository.
    #[must_use]
    pub fn new(
        requests: Arc<RequestRepository>,
        catalog: Arc<PolicyCatalog>,
        org: Arc<dyn OrgHierarchy>,
        notifier: Arc<dyn NotificationSink>,
        default_escalation_hours: u32,
    ) -> Self {
        Self {
            requests,
            catalog,
            org,
            notifier,
            default_escalation_hours,
        }
    }

    /// Escalates every overdue step at `now`.
    ///
    /// Each request is handled on its own: a failure is logged and recorded
    /// in the report, and the scan moves on. A request written concurrently
    /// is reported as a failure and picked up by the next scan.
    pub fn scan(&self, now: DateTime<Utc>) -> EscalationReport {
        let span = tracing::info_span!("escalation_scan", %now);
        let _guard = span.enter();

        let resolver = ChainResolver {
            org: self.org.as_ref(),
            delegations: self.catalog.as_ref(),
            default_escalation_hours: self.default_escalation_hours,
        };
        let mut report = EscalationReport::default();

        for request in self.requests.awaiting_decision() {
            let decision = EscalationPolicy::evaluate(&request, now, resolver);
            if !decision.is_actionable() {
                report.skipped += 1;
                continue;
            }
            let written = EscalationPolicy::apply(&request, &decision, now)
                .and_then(|t| {
                    let notifications = t.notifications;
                    self.requests.save(t.request).map(|saved| (saved, notifications))
                });
            match written {
                Ok((saved, notifications)) => {
                    dispatch(self.notifier.as_ref(), saved.id, &notifications);
                    match decision {
                        EscalationDecision::Reassign { from, to, role, .. } => {
                            tracing::info!(
                                request_id = %saved.id,
                                from = %from,
                                to = %to.approver_id,
                                role = %role,
                                "Approval step escalated"
                            );
                            report.escalated.push(saved.id);
                        }
                        _ => {
                            tracing::info!(request_id = %saved.id, "Approval step flagged as overdue");
                            report.flagged.push(saved.id);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(request_id = %request.id, error = %e, "Escalation failed");
                    report.failures.push((request.id, e.to_string()));
                }
            }
        }

        tracing::info!(
            escalated = report.escalated.len(),
            flagged = report.flagged.len(),
            skipped = report.skipped,
            failures = report.failures.len(),
            "Escalation scan finished"
        );
        report
    }
}
