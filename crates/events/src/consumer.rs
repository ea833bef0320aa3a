//! Payment-approval event consumer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use roost_core::{CoreError, IdempotencyKey, TourId};
use roost_domain::tour;
use roost_store::{MutationOutcome, MutationPipeline, MutationRequest, MutationStep, MutationStore};

use crate::envelope::{EventError, ServiceEnvelope};

/// Payment provider approval, delivered at-least-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentApproved {
    /// Provider reference; doubles as the idempotency key.
    pub reference: String,
    pub tour_id: TourId,
}

/// Consumes payment-approval envelopes and confirms the paid tour.
///
/// The envelope secret is verified before the payload is trusted; the
/// payment reference is then checked against the ledger exactly as in the
/// synchronous path, so redelivered approvals confirm the tour once.
pub struct PaymentEventConsumer<S> {
    pipeline: Arc<MutationPipeline<S>>,
    app_secret: Vec<u8>,
}

impl<S: MutationStore> PaymentEventConsumer<S> {
    pub fn new(pipeline: Arc<MutationPipeline<S>>, app_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            pipeline,
            app_secret: app_secret.into(),
        }
    }

    pub async fn handle(&self, envelope: &ServiceEnvelope) -> Result<MutationOutcome, EventError> {
        if let Err(err) = envelope.verify(&self.app_secret) {
            warn!(service = %envelope.service_name, "rejected poisoned event envelope");
            return Err(err);
        }

        let event: PaymentApproved = serde_json::from_value(envelope.payload.clone())
            .map_err(|e| EventError::Malformed(e.to_string()))?;
        let key = IdempotencyKey::parse(&event.reference)
            .map_err(|e| EventError::Malformed(e.to_string()))?;

        // Duplicate delivery short-circuits before the tour is even read.
        if let Some(record) = self
            .pipeline
            .store()
            .verify(&key)
            .await
            .map_err(CoreError::from)?
        {
            info!(reference = %event.reference, "payment approval already processed");
            return Ok(MutationOutcome::Replayed(record.response));
        }

        let tour_uuid = *event.tour_id.as_uuid();
        let mut doc = self
            .pipeline
            .store()
            .fetch(tour::COLLECTION, tour_uuid)
            .await
            .map_err(CoreError::from)?
            .ok_or(CoreError::NotFound)?;
        doc["status"] = json!("confirmed");
        doc["payment_ref"] = json!(event.reference);

        let request = MutationRequest::new(vec![MutationStep::update(
            tour::COLLECTION,
            tour_uuid,
            doc,
        )])
        .with_response(json!({"tour_id": event.tour_id, "status": "confirmed"}));

        let outcome = self.pipeline.execute(&key, request).await?;
        info!(reference = %event.reference, tour = %event.tour_id, "tour payment confirmed");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use roost_core::{AccountId, ListingId};
    use roost_domain::Tour;
    use roost_store::InMemoryStore;

    const SECRET: &[u8] = b"app-secret";

    async fn seed_tour(store: &InMemoryStore) -> Tour {
        let tour = Tour::new(ListingId::new(), AccountId::new(), Utc::now());
        store
            .execute(
                &IdempotencyKey::derived("seed-tour", tour.id),
                None,
                vec![MutationStep::insert(
                    tour::COLLECTION,
                    *tour.id.as_uuid(),
                    tour.document(),
                )],
            )
            .await
            .unwrap();
        tour
    }

    fn approval(tour_id: TourId, reference: &str) -> ServiceEnvelope {
        ServiceEnvelope::seal(
            "payments",
            serde_json::to_value(PaymentApproved {
                reference: reference.to_string(),
                tour_id,
            })
            .unwrap(),
            SECRET,
        )
        .unwrap()
    }

    fn consumer(store: Arc<InMemoryStore>) -> PaymentEventConsumer<Arc<InMemoryStore>> {
        PaymentEventConsumer::new(Arc::new(MutationPipeline::new(store)), SECRET)
    }

    #[tokio::test]
    async fn approval_confirms_the_tour() {
        let store = Arc::new(InMemoryStore::new());
        let tour = seed_tour(&store).await;
        let consumer = consumer(store.clone());

        let outcome = consumer
            .handle(&approval(tour.id, "pay_123"))
            .await
            .unwrap();
        assert!(!outcome.was_replayed());

        let doc = store
            .fetch(tour::COLLECTION, *tour.id.as_uuid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], json!("confirmed"));
        assert_eq!(doc["payment_ref"], json!("pay_123"));
    }

    #[tokio::test]
    async fn redelivered_approval_replays_without_a_second_mutation() {
        let store = Arc::new(InMemoryStore::new());
        let tour = seed_tour(&store).await;
        let consumer = consumer(store.clone());
        let envelope = approval(tour.id, "pay_123");

        let first = consumer.handle(&envelope).await.unwrap();
        let second = consumer.handle(&envelope).await.unwrap();

        assert!(!first.was_replayed());
        assert!(second.was_replayed());
        assert_eq!(first.response(), second.response());
    }

    #[tokio::test]
    async fn forged_envelopes_never_reach_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let tour = seed_tour(&store).await;
        let consumer = consumer(store.clone());

        let mut envelope = approval(tour.id, "pay_123");
        envelope.payload["reference"] = json!("pay_456");

        let err = consumer.handle(&envelope).await.unwrap_err();
        assert!(matches!(err, EventError::Poisoned(_)));

        let doc = store
            .fetch(tour::COLLECTION, *tour.id.as_uuid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], json!("pending"));
    }

    #[tokio::test]
    async fn unknown_tour_surfaces_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let consumer = consumer(store);

        let err = consumer
            .handle(&approval(TourId::from_uuid(Uuid::now_v7()), "pay_123"))
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Core(CoreError::NotFound)));
    }

    #[tokio::test]
    async fn empty_reference_is_malformed() {
        let store = Arc::new(InMemoryStore::new());
        let tour = seed_tour(&store).await;
        let consumer = consumer(store);

        let err = consumer.handle(&approval(tour.id, "")).await.unwrap_err();
        assert!(matches!(err, EventError::Malformed(_)));
    }
}
