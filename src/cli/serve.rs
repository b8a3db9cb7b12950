//! HTTP server command handler

use anyhow::{Context, Result};
use difficulty_detector::config::AppConfig;
use difficulty_detector::server::{self, AppState};

/// Load models, then serve until interrupted
pub fn run(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = AppState::from_config(&config)?;
    tracing::info!("Serving the {} predictor", state.predictor.name());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(server::serve(&host, port, state))
}
