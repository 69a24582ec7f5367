//! Storage errors.

use thiserror::Error;

/// Errors raised by the versioned maps.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record under the key.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record already exists under the key.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// The record changed since it was read.
    #[error("Version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Record key.
        key: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Seed data could not be read.
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
}

impl StoreError {
    /// Returns true if re-reading and retrying may succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}
