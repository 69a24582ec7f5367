//! Error taxonomy shared by every core module.

use std::fmt;

use furlough_shared::AppError;

/// Category of a domain error.
///
/// Validation and conflict errors never leave partial mutations behind;
/// configuration errors halt submission before any reservation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blocking validation failure.
    Validation,
    /// Decision against a non-active step, stale write, or lost race.
    Conflict,
    /// No applicable workflow, or a required role resolves to nobody.
    Configuration,
    /// Unknown request, balance or adjustment.
    NotFound,
    /// Caller may not act on this request.
    Forbidden,
    /// Storage or invariant failure.
    Internal,
}

impl ErrorKind {
    /// Wraps a message into the matching transport-facing error.
    #[must_use]
    pub fn into_app_error(self, message: String) -> AppError {
        match self {
            Self::Validation => AppError::Validation(message),
            Self::Conflict => AppError::Conflict(message),
            Self::Configuration => AppError::Configuration(message),
            Self::NotFound => AppError::NotFound(message),
            Self::Forbidden => AppError::Forbidden(message),
            Self::Internal => AppError::Internal(message),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Configuration => "configuration",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}
