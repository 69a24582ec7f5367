//! Repositories over the versioned maps.
//!
//! Each repository runs core services against stored state; the core
//! decides, the repository persists with compare-and-swap.

pub mod accrual;
pub mod adjustment;
pub mod balance;
pub mod catalog;
pub mod escalation;
pub mod request;
pub mod workflow;

pub use accrual::{AccrualRepository, AccrualRunReport};
pub use adjustment::AdjustmentLog;
pub use balance::BalanceRepository;
pub use catalog::{CatalogSeed, PolicyCatalog};
pub use escalation::{EscalationReport, EscalationRepository};
pub use request::RequestRepository;
pub use workflow::{LeaveWorkflowRepository, WorkflowDeps};

use furlough_core::collab::NotificationSink;
use furlough_core::workflow::Notification;
use furlough_shared::types::LeaveRequestId;

/// Delivers notifications; failures are logged and never propagated.
pub(crate) fn dispatch(sink: &dyn NotificationSink, request_id: LeaveRequestId, notifications: &[Notification]) {
    for n in notifications {
        if let Err(e) = sink.notify(n.event, request_id, &n.recipients) {
            tracing::warn!(
                request_id = %request_id,
                event = ?n.event,
                error = %e,
                "Notification delivery failed"
            );
        }
    }
}
