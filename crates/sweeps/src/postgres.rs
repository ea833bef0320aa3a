//! Postgres-backed candidate sources.
//!
//! Each source embeds the sweep's store-level filter in SQL over the
//! generic `documents` table and projects rows down to `SweepCandidate`s.
//! Ordering by id keeps offset pagination deterministic between fetches.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use roost_store::StoreError;

use crate::candidate::{PageCursor, SweepCandidate};
use crate::source::CandidateSource;

enum SourceQuery {
    /// Unapproved listings whose approval deadline has passed.
    ExpiredListings,
    /// Pending tours scheduled within the look-ahead window.
    UpcomingTours { window: Duration },
}

pub struct PostgresCandidateSource {
    pool: Arc<PgPool>,
    query: SourceQuery,
}

impl PostgresCandidateSource {
    pub fn expired_listings(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            query: SourceQuery::ExpiredListings,
        }
    }

    pub fn upcoming_tours(pool: PgPool, window: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            query: SourceQuery::UpcomingTours { window },
        }
    }

    fn candidate_from_row(
        prefix: &str,
        deadline_field: &str,
        id: Uuid,
        body: JsonValue,
    ) -> Result<SweepCandidate, StoreError> {
        let deadline: DateTime<Utc> = body
            .get(deadline_field)
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                StoreError::Serialization(format!("document {id} missing '{deadline_field}'"))
            })?;
        Ok(SweepCandidate {
            id,
            key: format!("{prefix}:{id}"),
            deadline,
            payload: body,
        })
    }
}

#[async_trait]
impl CandidateSource for PostgresCandidateSource {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Vec<SweepCandidate>, StoreError> {
        let (sql, prefix, deadline_field, horizon) = match &self.query {
            SourceQuery::ExpiredListings => (
                r#"
                SELECT id, body
                FROM documents
                WHERE collection = 'listings'
                  AND body->>'status' = 'pending_approval'
                  AND (body->>'approval_deadline')::timestamptz <= $1
                ORDER BY id
                LIMIT $2 OFFSET $3
                "#,
                "listing",
                "approval_deadline",
                Utc::now(),
            ),
            SourceQuery::UpcomingTours { window } => (
                r#"
                SELECT id, body
                FROM documents
                WHERE collection = 'tours'
                  AND body->>'status' = 'pending'
                  AND (body->>'scheduled_at')::timestamptz <= $1
                ORDER BY id
                LIMIT $2 OFFSET $3
                "#,
                "tour",
                "scheduled_at",
                Utc::now() + *window,
            ),
        };

        let rows = sqlx::query(sql)
            .bind(horizon)
            .bind(i64::from(cursor.page_size))
            .bind(cursor.offset() as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| StoreError::transient(format!("fetch_page: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row
                    .try_get("id")
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                let body: JsonValue = row
                    .try_get("body")
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Self::candidate_from_row(prefix, deadline_field, id, body)
            })
            .collect()
    }
}
