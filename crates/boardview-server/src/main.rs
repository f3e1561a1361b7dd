#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod api;
mod config;
mod error;
mod router;
mod session;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boardview_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    let config = ServerConfig::load()?;
    info!(
        base_url = %config.base_url,
        cache_backend = ?config.cache_backend,
        default_key = config.default_api_key.is_some(),
        "Starting boardview backend"
    );

    let state = Arc::new(AppState::from_config(config)?);
    let sweeper = match (state.local_store(), state.config.cache_sweep_secs) {
        (Some(store), Some(secs)) => Some(store.spawn_sweeper(Duration::from_secs(secs))),
        _ => None,
    };

    let addr = state.config.bind_address();
    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down");
        })
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.stop().await;
    }
    Ok(())
}
