use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use roost_store::MutationOutcome;

/// Applied mutations answer with `created`; replays answer 200 with the
/// recorded response, since the duplicate saw no new side effect.
pub fn outcome_to_response(
    created: StatusCode,
    outcome: MutationOutcome,
) -> axum::response::Response {
    let status = if outcome.was_replayed() {
        StatusCode::OK
    } else {
        created
    };
    let body = outcome.response().cloned().unwrap_or_else(|| json!({}));
    (status, axum::Json(body)).into_response()
}
