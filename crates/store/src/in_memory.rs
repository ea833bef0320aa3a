//! In-memory mutation store.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use roost_core::IdempotencyKey;

use crate::error::StoreError;
use crate::ledger::IdempotencyRecord;
use crate::steps::MutationStep;
use crate::store::MutationStore;

#[derive(Debug, Default, Clone)]
struct Inner {
    collections: HashMap<String, HashMap<Uuid, JsonValue>>,
    ledger: HashMap<String, IdempotencyRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn collection_len(&self, collection: &str) -> usize {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.collections.get(collection).map_or(0, HashMap::len)
    }

    /// Rewrite a ledger record's `created_at`.
    ///
    /// Test seam for exercising the retention window without waiting it out.
    pub fn backdate_record(&self, key: &IdempotencyKey, created_at: DateTime<Utc>) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some(record) = inner.ledger.get_mut(key.as_str()) {
            record.created_at = created_at;
        }
    }

    fn apply_steps(
        collections: &mut HashMap<String, HashMap<Uuid, JsonValue>>,
        steps: Vec<MutationStep>,
    ) -> Result<(), StoreError> {
        for step in steps {
            match step {
                MutationStep::Insert {
                    collection,
                    id,
                    document,
                } => {
                    let coll = collections.entry(collection.to_string()).or_default();
                    if coll.contains_key(&id) {
                        return Err(StoreError::conflict(format!(
                            "document {id} already exists in '{collection}'"
                        )));
                    }
                    coll.insert(id, document);
                }
                MutationStep::Update {
                    collection,
                    id,
                    document,
                } => {
                    let slot = collections
                        .get_mut(collection)
                        .and_then(|coll| coll.get_mut(&id))
                        .ok_or(StoreError::NotFound)?;
                    *slot = document;
                }
                MutationStep::Delete { collection, id } => {
                    let removed = collections
                        .get_mut(collection)
                        .and_then(|coll| coll.remove(&id));
                    if removed.is_none() {
                        return Err(StoreError::NotFound);
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MutationStore for InMemoryStore {
    async fn verify(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::fatal("store lock poisoned"))?;
        Ok(inner
            .ledger
            .get(key.as_str())
            .filter(|r| !r.is_expired_at(Utc::now()))
            .cloned())
    }

    async fn execute(
        &self,
        key: &IdempotencyKey,
        response: Option<JsonValue>,
        steps: Vec<MutationStep>,
    ) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::fatal("store lock poisoned"))?;

        // An expired record no longer guards the key; it is overwritten as
        // if the purge had already run.
        if let Some(existing) = inner.ledger.get(key.as_str()) {
            if !existing.is_expired_at(Utc::now()) {
                return Err(StoreError::conflict(format!(
                    "idempotency key '{key}' already recorded"
                )));
            }
        }

        // Apply to a scratch copy; swap in only on full success. Gives the
        // same all-or-nothing semantics a transaction would.
        let mut scratch = inner.collections.clone();
        Self::apply_steps(&mut scratch, steps)?;

        inner.collections = scratch;
        inner.ledger.insert(
            key.as_str().to_string(),
            IdempotencyRecord::new(key.clone(), response),
        );
        Ok(())
    }

    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::fatal("store lock poisoned"))?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|coll| coll.get(&id))
            .cloned())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::fatal("store lock poisoned"))?;
        let now = Utc::now();
        let before = inner.ledger.len();
        inner.ledger.retain(|_, r| !r.is_expired_at(now));
        Ok((before - inner.ledger.len()) as u64)
    }
}
