use std::sync::Arc;

use tracing::info;

use roost_api::app::{self, AppState};
use roost_api::config::Config;
use roost_api::scheduler;
use roost_store::{MutationStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    roost_observability::init();

    let config = Config::from_env()?;
    let pool = roost_store::connect(&config.database_url, config.max_connections).await?;

    let store: Arc<dyn MutationStore> = Arc::new(PostgresStore::new(pool.clone()));
    let state = AppState::new(store, config.app_secret.as_bytes());

    scheduler::spawn_sweeps(pool, state.pipeline.clone(), config.sweep_interval);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "roost api listening");
    axum::serve(listener, app::router(state)).await?;

    Ok(())
}
