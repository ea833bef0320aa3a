//! Cross-service event envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use roost_core::CoreError;

use crate::signature::{compute_secret, verify_secret};

/// Event consumption error.
#[derive(Debug, Error)]
pub enum EventError {
    /// Secret verification failed: a poisoned message, rejected before any
    /// mutation and never retried (retrying a forged message is pointless).
    #[error("envelope secret verification failed for '{0}'")]
    Poisoned(String),

    /// Payload did not deserialize into the expected event shape.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Failure from the mutation path.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// What asynchronous consumers receive from peer services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEnvelope {
    pub service_name: String,
    /// Hex HMAC-SHA256 of the canonical payload bytes under the
    /// application-wide secret.
    pub service_secret: String,
    pub payload: JsonValue,
}

impl ServiceEnvelope {
    /// Seal a payload on the producing side.
    pub fn seal(
        service_name: impl Into<String>,
        payload: JsonValue,
        app_secret: &[u8],
    ) -> Result<Self, EventError> {
        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| EventError::Malformed(e.to_string()))?;
        Ok(Self {
            service_name: service_name.into(),
            service_secret: compute_secret(&bytes, app_secret),
            payload,
        })
    }

    /// Verify the secret before trusting the payload.
    pub fn verify(&self, app_secret: &[u8]) -> Result<(), EventError> {
        let bytes = serde_json::to_vec(&self.payload)
            .map_err(|e| EventError::Malformed(e.to_string()))?;
        if verify_secret(&bytes, &self.service_secret, app_secret) {
            Ok(())
        } else {
            Err(EventError::Poisoned(self.service_name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sealed_envelopes_verify() {
        let envelope =
            ServiceEnvelope::seal("payments", json!({"reference": "pay_1"}), b"app-secret")
                .unwrap();
        assert!(envelope.verify(b"app-secret").is_ok());
    }

    #[test]
    fn tampered_payloads_are_poisoned() {
        let mut envelope =
            ServiceEnvelope::seal("payments", json!({"reference": "pay_1"}), b"app-secret")
                .unwrap();
        envelope.payload["reference"] = json!("pay_2");
        assert!(matches!(
            envelope.verify(b"app-secret"),
            Err(EventError::Poisoned(_))
        ));
    }

    #[test]
    fn wrong_app_secret_is_poisoned() {
        let envelope =
            ServiceEnvelope::seal("payments", json!({"reference": "pay_1"}), b"app-secret")
                .unwrap();
        assert!(envelope.verify(b"other-secret").is_err());
    }
}
