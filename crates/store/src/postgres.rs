//! Postgres-backed mutation store.
//!
//! Documents live in one generic table, the ledger in another:
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT        NOT NULL,
//!     id         UUID        NOT NULL,
//!     body       JSONB       NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (collection, id)
//! );
//!
//! CREATE TABLE idempotency_ledger (
//!     key        TEXT        PRIMARY KEY,
//!     response   JSONB       NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! `execute` runs every step plus the ledger insert inside one sqlx
//! transaction; the primary keys double as the uniqueness constraints that
//! resolve insertion races (SQLSTATE 23505 → `Conflict`). Cross-instance
//! safety is delegated entirely to Postgres transaction isolation and these
//! unique indexes; there is no advisory locking.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use roost_core::IdempotencyKey;

use crate::error::{StoreError, is_unique_violation, map_sqlx_error};
use crate::ledger::{IdempotencyRecord, ledger_retention};
use crate::steps::MutationStep;
use crate::store::MutationStore;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn apply_step(
        tx: &mut Transaction<'_, Postgres>,
        step: MutationStep,
    ) -> Result<(), StoreError> {
        match step {
            MutationStep::Insert {
                collection,
                id,
                document,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, body)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(collection)
                .bind(id)
                .bind(&document)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        StoreError::conflict(format!(
                            "document {id} already exists in '{collection}'"
                        ))
                    } else {
                        map_sqlx_error("insert_document", e)
                    }
                })?;
            }
            MutationStep::Update {
                collection,
                id,
                document,
            } => {
                let result = sqlx::query(
                    r#"
                    UPDATE documents
                    SET body = $3, updated_at = NOW()
                    WHERE collection = $1 AND id = $2
                    "#,
                )
                .bind(collection)
                .bind(id)
                .bind(&document)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("update_document", e))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound);
                }
            }
            MutationStep::Delete { collection, id } => {
                let result = sqlx::query(
                    r#"
                    DELETE FROM documents
                    WHERE collection = $1 AND id = $2
                    "#,
                )
                .bind(collection)
                .bind(id)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("delete_document", e))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MutationStore for PostgresStore {
    #[instrument(skip(self), fields(key = %key), err)]
    async fn verify(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, StoreError> {
        let cutoff = Utc::now() - ledger_retention();
        let row = sqlx::query(
            r#"
            SELECT key, response, created_at
            FROM idempotency_ledger
            WHERE key = $1 AND created_at > $2
            "#,
        )
        .bind(key.as_str())
        .bind(cutoff)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("verify_key", e))?;

        let Some(row) = row else { return Ok(None) };

        let raw: String = row
            .try_get("key")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let key = IdempotencyKey::parse(raw)
            .map_err(|e| StoreError::Serialization(format!("ledger row: {e}")))?;
        Ok(Some(IdempotencyRecord {
            key,
            response: row
                .try_get("response")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        }))
    }

    #[instrument(skip(self, response, steps), fields(key = %key, step_count = steps.len()), err)]
    async fn execute(
        &self,
        key: &IdempotencyKey,
        response: Option<JsonValue>,
        steps: Vec<MutationStep>,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for step in steps {
            if let Err(err) = Self::apply_step(&mut tx, step).await {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(err);
            }
        }

        // An expired record no longer guards the key; clear it so the
        // insert below behaves as if the purge had already run.
        let cutoff = Utc::now() - ledger_retention();
        if let Err(e) = sqlx::query(
            r#"
            DELETE FROM idempotency_ledger
            WHERE key = $1 AND created_at <= $2
            "#,
        )
        .bind(key.as_str())
        .bind(cutoff)
        .execute(&mut *tx)
        .await
        {
            let mapped = map_sqlx_error("clear_expired_key", e);
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(mapped);
        }

        // Ledger insert rides the same transaction: the mutation and its
        // processed-marker commit or roll back together.
        let inserted = sqlx::query(
            r#"
            INSERT INTO idempotency_ledger (key, response)
            VALUES ($1, $2)
            "#,
        )
        .bind(key.as_str())
        .bind(&response)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            let mapped = if is_unique_violation(&e) {
                StoreError::conflict(format!("idempotency key '{key}' already recorded"))
            } else {
                map_sqlx_error("record_key", e)
            };
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(mapped);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_document", e))?;

        row.map(|r| {
            r.try_get("body")
                .map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let cutoff = Utc::now() - ledger_retention();
        let result = sqlx::query(
            r#"
            DELETE FROM idempotency_ledger
            WHERE created_at <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("purge_ledger", e))?;

        Ok(result.rows_affected())
    }
}
