use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use roost_core::AccountId;
use roost_domain::listing::{self, Listing};
use roost_store::{MutationRequest, MutationStep};

use crate::app::AppState;
use crate::app::errors::core_error_to_response;
use crate::app::extract::idempotency_key;
use crate::app::routes::common::outcome_to_response;

#[derive(Debug, Deserialize)]
pub struct CreateListing {
    pub host: AccountId,
    pub title: String,
    pub approval_deadline: DateTime<Utc>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateListing>,
) -> Response {
    let key = match idempotency_key(&headers) {
        Ok(key) => key,
        Err(response) => return response,
    };

    let listing = Listing::new(body.host, body.title, body.approval_deadline);
    let request = MutationRequest::new(vec![MutationStep::insert(
        listing::COLLECTION,
        *listing.id.as_uuid(),
        listing.document(),
    )])
    .with_hook(Arc::new(listing::normalize_title))
    .with_response(json!({"id": listing.id}));

    match state.pipeline.execute(&key, request).await {
        Ok(outcome) => outcome_to_response(StatusCode::CREATED, outcome),
        Err(err) => core_error_to_response(&err),
    }
}
