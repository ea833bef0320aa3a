//! Policy-chained store connection establishment.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use roost_reliability::RetryPolicy;

use crate::error::StoreError;

/// Connect to the store, chaining exponential backoff onto a
/// linear-jitter fallback.
///
/// If both policies exhaust, the result is a fatal connectivity error
/// carrying the underlying failure message; it is not retried further.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let chain = RetryPolicy::exponential().with_fallback(RetryPolicy::linear_jitter());

    let pool = chain
        .run(|| {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(database_url)
        })
        .await
        .map_err(|e| StoreError::fatal(format!("store connection failed: {e}")))?;

    info!(max_connections, "store connection pool established");
    Ok(pool)
}
