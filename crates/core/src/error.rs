//! Error taxonomy shared across the platform.

use thiserror::Error;

/// Result type used across the core and its consumers.
pub type CoreResult<T> = Result<T, CoreError>;

/// Typed error hierarchy for the reliability core.
///
/// Only `Conflict`, `NotFound` and exhausted-retry `Fatal` errors cross the
/// core's boundary to callers; `Transient` conditions are absorbed by retry
/// or failure-isolation logic on the way out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value failed validation (e.g. malformed input, missing key).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate idempotency key or losing side of an insertion race.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A target entity was missing inside a transactional mutation.
    #[error("not found")]
    NotFound,

    /// Transient store/network failure; safe to retry.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Retries (and any fallback policy) exhausted; not retried further.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Whether a retry policy may re-attempt the failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Transient(_))
    }
}
