use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use roost_core::{AccountId, CoreError, ListingId};
use roost_domain::tour::{self, Tour};
use roost_domain::listing;
use roost_store::{MutationRequest, MutationStep};

use crate::app::AppState;
use crate::app::errors::core_error_to_response;
use crate::app::extract::idempotency_key;
use crate::app::routes::common::outcome_to_response;

#[derive(Debug, Deserialize)]
pub struct BookTour {
    pub listing_id: ListingId,
    pub guest: AccountId,
    pub scheduled_at: DateTime<Utc>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BookTour>,
) -> Response {
    let key = match idempotency_key(&headers) {
        Ok(key) => key,
        Err(response) => return response,
    };

    // The listing must exist before a tour of it can be booked.
    match state
        .store
        .fetch(listing::COLLECTION, *body.listing_id.as_uuid())
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => return core_error_to_response(&CoreError::NotFound),
        Err(err) => return core_error_to_response(&err.into()),
    }

    let booked = Tour::new(body.listing_id, body.guest, body.scheduled_at);
    let request = MutationRequest::new(vec![MutationStep::insert(
        tour::COLLECTION,
        *booked.id.as_uuid(),
        booked.document(),
    )])
    .with_response(json!({"id": booked.id}));

    match state.pipeline.execute(&key, request).await {
        Ok(outcome) => outcome_to_response(StatusCode::CREATED, outcome),
        Err(err) => core_error_to_response(&err),
    }
}
