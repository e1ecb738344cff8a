//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::fetch::HttpSourceFetcher;
use crate::state::AppState;
use anyhow::{Context, Result};
use pixmill_core::Config;
use std::sync::Arc;

/// Validate config, start tracing and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        public_origin = config.public_origin().unwrap_or("-"),
        allow_private_sources = config.allow_private_sources(),
        "Configuration loaded and validated successfully"
    );

    let fetcher = HttpSourceFetcher::from_config(&config)?;
    let state = Arc::new(AppState::new(config.clone(), Arc::new(fetcher)));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
