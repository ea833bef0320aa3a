//! Application state and router assembly.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use roost_events::PaymentEventConsumer;
use roost_store::{MutationPipeline, MutationStore};

pub mod errors;
pub mod extract;
pub mod routes;

/// Shared handler state.
///
/// The store is held as a trait object so the same router serves the
/// Postgres backend in production and the in-memory backend in tests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MutationStore>,
    pub pipeline: Arc<MutationPipeline<Arc<dyn MutationStore>>>,
    pub consumer: Arc<PaymentEventConsumer<Arc<dyn MutationStore>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn MutationStore>, app_secret: &[u8]) -> Self {
        let pipeline = Arc::new(MutationPipeline::new(store.clone()));
        let consumer = Arc::new(PaymentEventConsumer::new(pipeline.clone(), app_secret));
        Self {
            store,
            pipeline,
            consumer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/listings", post(routes::listings::create))
        .route("/tours", post(routes::tours::create))
        .route("/events/payments", post(routes::payments::receive))
        .with_state(state)
}
