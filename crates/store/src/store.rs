//! The transactional mutation seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use roost_core::IdempotencyKey;

use crate::error::StoreError;
use crate::ledger::IdempotencyRecord;
use crate::steps::MutationStep;

/// Transactional document store with an embedded idempotency ledger.
///
/// ## Execute semantics
///
/// `execute` opens one atomic transaction, applies the domain steps in
/// order, then inserts the ledger record for `key` before committing.
/// Either the domain mutation and the ledger record both persist, or
/// neither does; a crash between "mutation applied" and "ledger recorded"
/// is impossible by construction. That makes the whole call safe to wrap in
/// a retry policy: a retried attempt either short-circuits on `verify` or
/// performs the full mutation exactly once.
///
/// ## Failure semantics
///
/// - A missing `Update`/`Delete` target aborts with `NotFound`, no partial
///   writes.
/// - A duplicate key aborts with `Conflict`; the caller re-verifies and
///   treats the key as already processed. The ledger never silently
///   overwrites.
#[async_trait]
pub trait MutationStore: Send + Sync {
    /// Side-effect-free ledger lookup. Expired records are treated as absent.
    async fn verify(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, StoreError>;

    /// Atomically apply `steps` and record `key` (with its replay response).
    async fn execute(
        &self,
        key: &IdempotencyKey,
        response: Option<JsonValue>,
        steps: Vec<MutationStep>,
    ) -> Result<(), StoreError>;

    /// Fetch a single document body.
    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError>;

    /// Delete ledger records older than the retention window; returns the
    /// number purged.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S> MutationStore for Arc<S>
where
    S: MutationStore + ?Sized,
{
    async fn verify(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, StoreError> {
        (**self).verify(key).await
    }

    async fn execute(
        &self,
        key: &IdempotencyKey,
        response: Option<JsonValue>,
        steps: Vec<MutationStep>,
    ) -> Result<(), StoreError> {
        (**self).execute(key, response, steps).await
    }

    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        (**self).fetch(collection, id).await
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        (**self).purge_expired().await
    }
}
