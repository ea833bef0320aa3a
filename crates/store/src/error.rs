//! Store-layer error model and sqlx error mapping.

use thiserror::Error;

use roost_core::CoreError;

/// Storage operation error.
///
/// `Transient` is the only variant a retry policy may re-attempt; everything
/// else is deterministic and retrying would just repeat the failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-key violation: duplicate idempotency key or duplicate document.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Target document missing inside a transactional mutation.
    #[error("not found")]
    NotFound,

    /// Connectivity/pool failure; safe to retry.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// Document payload could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Unrecoverable store failure (including exhausted connection chains).
    #[error("fatal store failure: {0}")]
    Fatal(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            StoreError::NotFound => CoreError::NotFound,
            StoreError::Transient(msg) => CoreError::Transient(msg),
            StoreError::Serialization(msg) => CoreError::Validation(msg),
            StoreError::Fatal(msg) => CoreError::Fatal(msg),
        }
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Map a sqlx error into the store taxonomy.
///
/// | sqlx error | StoreError | Scenario |
/// |------------|------------|----------|
/// | Database (23505) | `Conflict` | duplicate key / losing side of an insertion race |
/// | RowNotFound | `NotFound` | document expected but missing |
/// | Io / PoolTimedOut / PoolClosed / Protocol | `Transient` | connectivity; retried by the enclosing policy |
/// | anything else | `Fatal` | malformed query, TLS, worker crash |
pub(crate) fn map_sqlx_error(op: &str, e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        return StoreError::Conflict(format!("{op}: {e}"));
    }
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Protocol(_) => StoreError::Transient(format!("{op}: {e}")),
        other => StoreError::Fatal(format!("{op}: {other}")),
    }
}
