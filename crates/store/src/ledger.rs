//! Durable record of processed idempotency keys.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use roost_core::IdempotencyKey;

/// Fixed retention window for processed keys.
///
/// A store-level TTL index that auto-purges expired records is equivalent;
/// backends that lack one expose `purge_expired` for the periodic sweep.
pub fn ledger_retention() -> Duration {
    Duration::hours(24)
}

/// One processed key plus the response to replay on duplicate delivery.
///
/// At most one record may exist per key; insertion races are resolved by the
/// store's uniqueness constraint: the loser observes a conflict and must
/// re-verify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    /// `None` for fire-and-forget operations that only need a "processed"
    /// marker.
    pub response: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(key: IdempotencyKey, response: Option<JsonValue>) -> Self {
        Self {
            key,
            response,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= ledger_retention()
    }
}
