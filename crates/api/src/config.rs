//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string (`DATABASE_URL`, required).
    pub database_url: String,
    /// Listen address (`ROOST_BIND_ADDR`, default `0.0.0.0:8080`).
    pub bind_addr: SocketAddr,
    /// Shared secret for cross-service envelopes (`ROOST_SERVICE_SECRET`,
    /// required).
    pub app_secret: String,
    /// Sweep scheduler tick (`ROOST_SWEEP_INTERVAL_SECS`, default 300).
    pub sweep_interval: Duration,
    /// Store pool size (`ROOST_MAX_CONNECTIONS`, default 10).
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let app_secret =
            std::env::var("ROOST_SERVICE_SECRET").context("ROOST_SERVICE_SECRET is required")?;

        let bind_addr = match std::env::var("ROOST_BIND_ADDR") {
            Ok(raw) => raw.parse().context("invalid ROOST_BIND_ADDR")?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let sweep_interval = match std::env::var("ROOST_SWEEP_INTERVAL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .context("invalid ROOST_SWEEP_INTERVAL_SECS")?,
            ),
            Err(_) => Duration::from_secs(300),
        };

        let max_connections = match std::env::var("ROOST_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("invalid ROOST_MAX_CONNECTIONS")?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url,
            bind_addr,
            app_secret,
            sweep_interval,
            max_connections,
        })
    }
}
