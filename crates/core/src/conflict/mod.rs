//! Conflict detection run before a request is submitted.
//!
//! - Overlap with the requester's other booked requests (advisory)
//! - Team concurrency threshold (advisory)
//! - Block periods (blocking)

pub mod detector;
pub mod types;

#[cfg(test)]
mod detector_props;

pub use detector::ConflictDetector;
pub use types::{ConflictContext, ConflictReport};
