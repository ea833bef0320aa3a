//! Interval-driven sweep trigger.
//!
//! Stands in for the external scheduler: every tick runs the expiry sweep,
//! the reminder sweep, and the ledger purge, sequentially. A failed tick is
//! logged and the next tick starts from page zero; the store-level filters
//! re-select whatever is still eligible.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};

use roost_store::{MutationPipeline, MutationStore};
use roost_sweeps::{
    CursorSweepGenerator, ExpireListings, PostgresCandidateSource, SweepOrchestrator, SweepWindow,
    TourReminders, TracingNotifier, purge_ledger,
};

/// How far ahead of `scheduled_at` tour reminders look.
const REMINDER_WINDOW_HOURS: i64 = 24;

pub fn spawn_sweeps(
    pool: PgPool,
    pipeline: Arc<MutationPipeline<Arc<dyn MutationStore>>>,
    tick: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        // The first tick fires immediately; skip it so startup isn't a sweep.
        interval.tick().await;

        loop {
            interval.tick().await;
            run_tick(&pool, &pipeline).await;
        }
    })
}

async fn run_tick(pool: &PgPool, pipeline: &Arc<MutationPipeline<Arc<dyn MutationStore>>>) {
    let orchestrator = SweepOrchestrator::new();

    let mut expiry = CursorSweepGenerator::new(
        PostgresCandidateSource::expired_listings(pool.clone()),
        SweepWindow::Overdue,
    );
    match orchestrator
        .run(&mut expiry, &ExpireListings::new(pipeline.clone()))
        .await
    {
        Ok(log) => info!(
            success = log.success_count,
            failures = log.failure_count,
            retried = log.retried_count,
            "listing expiry sweep finished"
        ),
        Err(err) => error!(error = %err, "listing expiry sweep aborted"),
    }

    let window = ChronoDuration::hours(REMINDER_WINDOW_HOURS);
    let mut reminders = CursorSweepGenerator::new(
        PostgresCandidateSource::upcoming_tours(pool.clone(), window),
        SweepWindow::Approaching { window },
    );
    match orchestrator
        .run(&mut reminders, &TourReminders::new(TracingNotifier))
        .await
    {
        Ok(log) => info!(
            success = log.success_count,
            failures = log.failure_count,
            "tour reminder sweep finished"
        ),
        Err(err) => error!(error = %err, "tour reminder sweep aborted"),
    }

    if let Err(err) = purge_ledger(pipeline.store()).await {
        error!(error = %err, "ledger purge failed");
    }
}
