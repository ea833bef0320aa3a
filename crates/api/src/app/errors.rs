//! Centralized error→response dispatch.
//!
//! One function maps the typed error taxonomy to transport responses; no
//! downcast chains in handlers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use roost_core::CoreError;
use roost_events::EventError;

pub fn core_error_to_response(err: &CoreError) -> axum::response::Response {
    match err {
        CoreError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        CoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        CoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        CoreError::Transient(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        CoreError::Fatal(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_failure", msg)
        }
    }
}

pub fn event_error_to_response(err: &EventError) -> axum::response::Response {
    match err {
        EventError::Poisoned(service) => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            format!("envelope from '{service}' failed verification"),
        ),
        EventError::Malformed(msg) => json_error(StatusCode::BAD_REQUEST, "malformed_payload", msg),
        EventError::Core(core) => core_error_to_response(core),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
