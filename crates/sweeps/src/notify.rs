//! Outbound notification boundary.
//!
//! Delivery mechanics (mail, SMS) live outside this repository; sweeps only
//! need something to hand a recipient and a message to.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, message: &str) -> anyhow::Result<()>;
}

/// Logs notifications instead of delivering them. Dev/default wiring until
/// a real dispatcher is plugged in.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> anyhow::Result<()> {
        info!(recipient, message, "notification dispatched");
        Ok(())
    }
}
