//! `roost-events` — cross-service event consumption.
//!
//! Asynchronous consumers receive `{service_name, service_secret, payload}`
//! envelopes. The secret is a keyed hash over the payload; it is verified
//! before the payload is trusted, and the embedded idempotency key is
//! checked exactly as in the synchronous path before any mutation.

pub mod consumer;
pub mod envelope;
pub mod signature;

pub use consumer::{PaymentApproved, PaymentEventConsumer};
pub use envelope::{EventError, ServiceEnvelope};
