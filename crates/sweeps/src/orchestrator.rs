//! Drives a generator, isolates per-item failures, reports a summary.

use async_trait::async_trait;
use chrono::Duration;
use tracing::{info, warn};

use roost_reliability::TtlCache;
use roost_store::StoreError;

use crate::candidate::SweepCandidate;
use crate::generator::CursorSweepGenerator;
use crate::source::CandidateSource;

/// Per-item sweep action (delete-if-expired, send-notification, ...).
#[async_trait]
pub trait SweepAction: Send + Sync {
    async fn apply(&self, candidate: &SweepCandidate) -> anyhow::Result<()>;
}

/// A candidate whose action failed, plus the diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFailure {
    pub candidate: SweepCandidate,
    pub error: String,
}

/// Summary of one sweep run.
#[derive(Debug, Default, PartialEq)]
pub struct SweepLog {
    pub success_count: u32,
    pub failure_count: u32,
    pub retried_count: u32,
    pub remaining_errors: Vec<SweepFailure>,
}

/// Sequential sweep driver.
///
/// Candidates are processed in generator-yield order, one at a time, to
/// bound load on the store and on downstream notification targets. The
/// failure cache and counters are exclusively owned by one `run` and never
/// shared across concurrent sweeps.
pub struct SweepOrchestrator {
    failure_ttl: Duration,
    retry_failures: bool,
}

impl Default for SweepOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepOrchestrator {
    pub fn new() -> Self {
        Self {
            failure_ttl: Duration::hours(2),
            retry_failures: true,
        }
    }

    /// Skip the second pass over the failure set.
    pub fn without_retry_pass(mut self) -> Self {
        self.retry_failures = false;
        self
    }

    /// Exhaust the generator, applying `action` per candidate.
    ///
    /// One candidate's failure never aborts the sweep: it is recorded in the
    /// TTL-backed failure set and the run continues. After the generator is
    /// exhausted, an optional retry pass replays the failure set once,
    /// dropping entries that succeed.
    pub async fn run<S, A>(
        &self,
        generator: &mut CursorSweepGenerator<S>,
        action: &A,
    ) -> Result<SweepLog, StoreError>
    where
        S: CandidateSource,
        A: SweepAction + ?Sized,
    {
        let mut failures: TtlCache<String, SweepFailure> = TtlCache::new(self.failure_ttl);
        let mut log = SweepLog::default();

        while let Some(candidate) = generator.next().await? {
            match action.apply(&candidate).await {
                Ok(()) => log.success_count += 1,
                Err(err) => {
                    warn!(candidate = %candidate.key, error = %err, "sweep action failed, continuing");
                    log.failure_count += 1;
                    failures.set(
                        candidate.key.clone(),
                        SweepFailure {
                            candidate,
                            error: format!("{err:#}"),
                        },
                    );
                }
            }
        }

        if self.retry_failures {
            for (_, failure) in failures.drain() {
                match action.apply(&failure.candidate).await {
                    Ok(()) => log.retried_count += 1,
                    Err(err) => log.remaining_errors.push(SweepFailure {
                        candidate: failure.candidate,
                        error: format!("{err:#}"),
                    }),
                }
            }
        } else {
            log.remaining_errors = failures.drain().into_iter().map(|(_, f)| f).collect();
        }

        info!(
            success = log.success_count,
            failures = log.failure_count,
            retried = log.retried_count,
            remaining = log.remaining_errors.len(),
            "sweep finished"
        );
        Ok(log)
    }
}
