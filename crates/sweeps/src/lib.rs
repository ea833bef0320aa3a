//! `roost-sweeps` — resumable, paginated, failure-isolated sweeps.
//!
//! A sweep pulls candidates from a `CursorSweepGenerator` (lazy, page-at-a-
//! time, filtered by a deadline window), applies a per-item `SweepAction`,
//! and aggregates failures into a TTL-cached failure set instead of
//! aborting. Concrete tasks cover the two sweep variants the platform runs:
//! "already overdue → remove" and "approaching deadline → notify".

pub mod candidate;
pub mod generator;
pub mod notify;
pub mod orchestrator;
pub mod postgres;
pub mod source;
pub mod tasks;

pub use candidate::{PageCursor, SweepCandidate, SweepWindow};
pub use generator::CursorSweepGenerator;
pub use notify::{Notifier, TracingNotifier};
pub use orchestrator::{SweepAction, SweepFailure, SweepLog, SweepOrchestrator};
pub use postgres::PostgresCandidateSource;
pub use source::{CandidateSource, InMemoryCandidateSource};
pub use tasks::{ExpireListings, TourReminders, purge_ledger};
