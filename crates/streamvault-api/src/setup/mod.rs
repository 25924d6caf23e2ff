//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use streamvault_core::{Config, RecordStoreBackend};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        record_store = %config.record_store,
        "Configuration loaded and validated successfully"
    );

    let pool = match config.record_store {
        RecordStoreBackend::Postgres => Some(database::setup_database(&config).await?),
        RecordStoreBackend::Memory => None,
    };

    let state = services::initialize_services(&config, pool).await?;

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
