//! Concrete sweep tasks the platform schedules.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use roost_core::{CoreError, IdempotencyKey};
use roost_domain::listing;
use roost_store::{MutationPipeline, MutationRequest, MutationStep, MutationStore, StoreError};

use crate::candidate::SweepCandidate;
use crate::notify::Notifier;
use crate::orchestrator::SweepAction;

/// "Already overdue → remove": delete an unapproved listing whose approval
/// deadline has passed.
///
/// Deletion rides the idempotent pipeline under a key derived from the
/// listing id, so a candidate re-seen by a later page fetch (or a later
/// run inside the retention window) dedupes instead of failing.
pub struct ExpireListings<S> {
    pipeline: Arc<MutationPipeline<S>>,
}

impl<S> ExpireListings<S> {
    pub fn new(pipeline: Arc<MutationPipeline<S>>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl<S: MutationStore> SweepAction for ExpireListings<S> {
    async fn apply(&self, candidate: &SweepCandidate) -> anyhow::Result<()> {
        let key = IdempotencyKey::derived("listing-expire", candidate.id);
        let request = MutationRequest::new(vec![MutationStep::delete(
            listing::COLLECTION,
            candidate.id,
        )]);

        match self.pipeline.execute(&key, request).await {
            Ok(outcome) => {
                if outcome.was_replayed() {
                    debug!(listing = %candidate.id, "removal already recorded, skipping");
                } else {
                    info!(listing = %candidate.id, "expired listing removed");
                }
                Ok(())
            }
            // Gone already (ledger record aged out after the delete): done.
            Err(CoreError::NotFound) => {
                debug!(listing = %candidate.id, "listing already removed");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// "Approaching deadline → notify": remind the guest of an upcoming tour.
pub struct TourReminders<N> {
    notifier: N,
}

impl<N> TourReminders<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<N: Notifier> SweepAction for TourReminders<N> {
    async fn apply(&self, candidate: &SweepCandidate) -> anyhow::Result<()> {
        let guest = candidate.payload["guest"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| "unknown-guest".to_string());
        let message = format!(
            "Reminder: your tour {} is scheduled for {}",
            candidate.id, candidate.deadline
        );
        self.notifier.notify(&guest, &message).await
    }
}

/// Drop ledger records older than the retention window.
///
/// Scheduled alongside the sweeps; backends with a store-level TTL index
/// make this a no-op.
pub async fn purge_ledger<S: MutationStore>(store: &S) -> Result<u64, StoreError> {
    let purged = store.purge_expired().await?;
    if purged > 0 {
        info!(purged, "expired ledger records purged");
    }
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{Duration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use roost_store::InMemoryStore;

    use crate::candidate::SweepWindow;
    use crate::generator::CursorSweepGenerator;
    use crate::orchestrator::SweepOrchestrator;
    use crate::source::InMemoryCandidateSource;

    fn overdue_candidate(id: Uuid) -> SweepCandidate {
        SweepCandidate {
            id,
            key: format!("listing:{id}"),
            deadline: Utc::now() - Duration::hours(1),
            payload: json!({"status": "pending_approval"}),
        }
    }

    #[tokio::test]
    async fn expired_listings_are_removed_idempotently() {
        let store = Arc::new(InMemoryStore::new());
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::now_v7()).collect();
        for id in &ids {
            store
                .execute(
                    &IdempotencyKey::derived("seed", id),
                    None,
                    vec![MutationStep::insert(
                        listing::COLLECTION,
                        *id,
                        json!({"status": "pending_approval"}),
                    )],
                )
                .await
                .unwrap();
        }

        let pipeline = Arc::new(MutationPipeline::new(store.clone()));
        let action = ExpireListings::new(pipeline);
        let candidates: Vec<_> = ids.iter().map(|id| overdue_candidate(*id)).collect();

        let mut generator = CursorSweepGenerator::new(
            InMemoryCandidateSource::new(candidates.clone()),
            SweepWindow::Overdue,
        );
        let log = SweepOrchestrator::new()
            .run(&mut generator, &action)
            .await
            .unwrap();

        assert_eq!(log.success_count, 2);
        assert_eq!(store.collection_len(listing::COLLECTION), 0);

        // A stale source re-yields the same candidates: every removal
        // replays instead of failing.
        let mut generator = CursorSweepGenerator::new(
            InMemoryCandidateSource::new(candidates),
            SweepWindow::Overdue,
        );
        let log = SweepOrchestrator::new()
            .run(&mut generator, &action)
            .await
            .unwrap();
        assert_eq!(log.success_count, 2);
        assert_eq!(log.failure_count, 0);
    }

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, recipient: &str, message: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn upcoming_tours_notify_the_guest() {
        let guest = Uuid::now_v7();
        let tour = SweepCandidate {
            id: Uuid::now_v7(),
            key: "tour:1".to_string(),
            deadline: Utc::now() + Duration::hours(2),
            payload: json!({"guest": guest.to_string(), "status": "pending"}),
        };

        let notifier = RecordingNotifier::default();
        let action = TourReminders::new(notifier.clone());
        let mut generator = CursorSweepGenerator::new(
            InMemoryCandidateSource::new(vec![tour]),
            SweepWindow::Approaching {
                window: Duration::hours(24),
            },
        );

        let log = SweepOrchestrator::new()
            .run(&mut generator, &action)
            .await
            .unwrap();

        assert_eq!(log.success_count, 1);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, guest.to_string());
    }
}
