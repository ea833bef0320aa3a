//! Request header extraction.

use axum::http::{HeaderMap, StatusCode};

use roost_core::IdempotencyKey;

use super::errors::json_error;

/// Header carrying the caller-supplied idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Extract the idempotency key for a mutating request.
///
/// A missing or empty header is a 400, never a defaulted key: defaulting
/// defeats deduplication for the call.
pub fn idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, axum::response::Response> {
    let raw = headers.get(IDEMPOTENCY_KEY_HEADER).ok_or_else(|| {
        json_error(
            StatusCode::BAD_REQUEST,
            "missing_idempotency_key",
            format!("mutating requests require the '{IDEMPOTENCY_KEY_HEADER}' header"),
        )
    })?;

    let raw = raw.to_str().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_idempotency_key",
            "idempotency key must be valid UTF-8",
        )
    })?;

    IdempotencyKey::parse(raw)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_idempotency_key", e.to_string()))
}
