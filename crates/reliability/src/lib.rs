//! `roost-reliability` — retry policies and the sweep failure cache.
//!
//! Building blocks the rest of the platform composes: a lazily-evicting
//! TTL cache and a small family of backoff strategies with policy chaining.

pub mod cache;
pub mod retry;

pub use cache::TtlCache;
pub use retry::{Backoff, PolicyChain, RetryContext, RetryPolicy};
