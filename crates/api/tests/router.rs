//! In-process router tests over the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;
use uuid::Uuid;

use roost_api::app::{self, AppState};
use roost_core::IdempotencyKey;
use roost_domain::tour;
use roost_events::{PaymentApproved, ServiceEnvelope};
use roost_store::{InMemoryStore, MutationStep, MutationStore};

const SECRET: &[u8] = b"test-secret";

fn test_app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(store.clone(), SECRET);
    (app::router(state), store)
}

fn post(uri: &str, key: Option<&str>, body: JsonValue) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header("idempotency-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_listing_body() -> JsonValue {
    json!({
        "host": Uuid::now_v7(),
        "title": "Harbor Loft",
        "approval_deadline": Utc::now() + Duration::hours(48),
    })
}

#[tokio::test]
async fn health_answers_ok() {
    let (router, _) = test_app();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn mutating_requests_without_a_key_are_rejected() {
    let (router, store) = test_app();

    let response = router
        .oneshot(post("/listings", None, create_listing_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("missing_idempotency_key"));
    assert_eq!(store.collection_len("listings"), 0);
}

#[tokio::test]
async fn duplicate_listing_creation_replays() {
    let (router, store) = test_app();
    let body = create_listing_body();

    let first = router
        .clone()
        .oneshot(post("/listings", Some("abc123"), body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_body = response_json(first).await;

    let second = router
        .oneshot(post("/listings", Some("abc123"), body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = response_json(second).await;

    assert_eq!(first_body["id"], second_body["id"]);
    assert_eq!(store.collection_len("listings"), 1);
}

#[tokio::test]
async fn booking_a_tour_of_a_missing_listing_is_not_found() {
    let (router, _) = test_app();

    let response = router
        .oneshot(post(
            "/tours",
            Some("book-1"),
            json!({
                "listing_id": Uuid::now_v7(),
                "guest": Uuid::now_v7(),
                "scheduled_at": Utc::now() + Duration::hours(4),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn payment_events_confirm_tours_once() {
    let (router, store) = test_app();

    // Seed a pending tour directly in the store.
    let tour_id = Uuid::now_v7();
    store
        .execute(
            &IdempotencyKey::parse("seed").unwrap(),
            None,
            vec![MutationStep::insert(
                tour::COLLECTION,
                tour_id,
                json!({
                    "id": tour_id,
                    "listing_id": Uuid::now_v7(),
                    "guest": Uuid::now_v7(),
                    "scheduled_at": Utc::now() + Duration::hours(4),
                    "status": "pending",
                    "payment_ref": null,
                }),
            )],
        )
        .await
        .unwrap();

    let envelope = ServiceEnvelope::seal(
        "payments",
        serde_json::to_value(PaymentApproved {
            reference: "pay_123".to_string(),
            tour_id: tour_id.into(),
        })
        .unwrap(),
        SECRET,
    )
    .unwrap();
    let envelope_json = serde_json::to_value(&envelope).unwrap();

    let first = router
        .clone()
        .oneshot(post("/events/payments", None, envelope_json.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let redelivery = router
        .clone()
        .oneshot(post("/events/payments", None, envelope_json))
        .await
        .unwrap();
    assert_eq!(redelivery.status(), StatusCode::OK);

    let doc = store.fetch(tour::COLLECTION, tour_id).await.unwrap().unwrap();
    assert_eq!(doc["status"], json!("confirmed"));

    // A forged envelope is rejected before any mutation.
    let mut forged = envelope;
    forged.payload["reference"] = json!("pay_999");
    let rejected = router
        .oneshot(post(
            "/events/payments",
            None,
            serde_json::to_value(&forged).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    let doc = store.fetch(tour::COLLECTION, tour_id).await.unwrap().unwrap();
    assert_eq!(doc["payment_ref"], json!("pay_123"));
}
