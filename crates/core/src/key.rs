//! Idempotency keys for externally-triggered mutations.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Longest key accepted; keeps the ledger's unique index cheap.
const MAX_KEY_BYTES: usize = 255;

/// Caller-supplied token guaranteeing a mutating operation's side effect
/// happens at most once regardless of retransmission.
///
/// Construction rejects missing/empty keys instead of defaulting to `""` or
/// a fresh random value: a defaulted key either dedupes every keyless
/// request against every other or disables deduplication entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Parse a caller-supplied key, rejecting empty or oversized values.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("idempotency key must not be empty"));
        }
        if trimmed.len() > MAX_KEY_BYTES {
            return Err(CoreError::validation(format!(
                "idempotency key exceeds {MAX_KEY_BYTES} bytes"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derive a deterministic key for a server-generated mutation.
    ///
    /// Sweep deletes use this so that a re-seen candidate dedupes against
    /// the run that already removed it.
    pub fn derived(namespace: &str, id: impl core::fmt::Display) -> Self {
        Self(format!("{namespace}:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
