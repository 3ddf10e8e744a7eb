use std::sync::Arc;

use anyhow::{Context, Result};
use app_utils::{Config, init_tracing};
use server::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;
    info!(?config, "loaded configuration");

    let state = Arc::new(AppState::new(config.attendance_service()?)?);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("could not bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "serving dashboard");
    axum::serve(listener, server::app(state)).await?;

    Ok(())
}
