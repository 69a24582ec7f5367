//! Storage and orchestration layer for Furlough.
//!
//! This crate provides:
//! - Version-stamped in-memory maps with compare-and-swap writes
//! - Repositories that run the core services against stored state
//! - In-process collaborator implementations (org chart, notifier, sync)
//! - The `LeaveService` facade handed to transport

pub mod collab;
pub mod error;
pub mod repositories;
pub mod service;
pub mod versioned;

#[cfg(test)]
mod versioned_props;

pub use error::StoreError;
pub use repositories::{
    AccrualRepository, AccrualRunReport, BalanceRepository, CatalogSeed, EscalationReport,
    EscalationRepository, LeaveWorkflowRepository, PolicyCatalog, RequestRepository, WorkflowDeps,
};
pub use service::{LeaveService, Outcome};
pub use versioned::{Versioned, VersionedMap};
