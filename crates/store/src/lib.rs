//! `roost-store` — transactional document store and the idempotent
//! mutation protocol.
//!
//! The store seam is the `MutationStore` trait: one atomic `execute` that
//! applies ordered domain steps and records the idempotency key in the same
//! transaction. `InMemoryStore` backs tests/dev, `PostgresStore` backs
//! production, and `MutationPipeline` is the front door every
//! externally-triggered write goes through.

pub mod connect;
pub mod error;
pub mod in_memory;
pub mod ledger;
pub mod pipeline;
pub mod postgres;
pub mod steps;
pub mod store;

pub use connect::connect;
pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use ledger::{IdempotencyRecord, ledger_retention};
pub use pipeline::{MutationOutcome, MutationPipeline, MutationRequest, PreCommitHook};
pub use postgres::PostgresStore;
pub use steps::MutationStep;
pub use store::MutationStore;
