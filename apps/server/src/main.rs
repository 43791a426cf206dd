mod api;
mod config;
mod error;
mod events;
mod main_lib;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::main_lib::{app_router, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env()?;
    let listen_addr = config.listen_addr;
    let state = build_state(config).await?;
    let app = app_router(state.clone());

    let listener = TcpListener::bind(listen_addr).await?;
    info!("Finanzas server listening on {}", listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.ledger.stop_sync();
    info!("Finanzas server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
