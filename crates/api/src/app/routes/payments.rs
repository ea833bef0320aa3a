use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use roost_events::ServiceEnvelope;

use crate::app::AppState;
use crate::app::errors::event_error_to_response;
use crate::app::routes::common::outcome_to_response;

pub async fn receive(State(state): State<AppState>, Json(envelope): Json<ServiceEnvelope>) -> Response {
    match state.consumer.handle(&envelope).await {
        Ok(outcome) => outcome_to_response(StatusCode::OK, outcome),
        Err(err) => event_error_to_response(&err),
    }
}
