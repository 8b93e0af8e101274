//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the store backend from configuration
//! - Assemble the service context
//! - Warm the task-count cache and install the metrics recorder
//!
//! # Design Decisions
//! - Fail fast on configuration problems (bad store settings, recorder)
//! - An unreachable store at boot is logged, not fatal: health reports it

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::AppConfig;
use crate::http::AppState;
use crate::observability::metrics;
use crate::store::{self, StoreError};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("metrics recorder setup failed: {0}")]
    Metrics(#[from] BuildError),
}

/// Build the application state for one instance.
pub async fn bootstrap(config: &AppConfig) -> Result<AppState, StartupError> {
    let kv = store::connect(&config.store)?;
    let mut state = AppState::new(config, kv);

    match state.tasks.warm_count().await {
        Ok(count) => tracing::info!(tasks = count, "Task count cache warmed"),
        Err(e) => tracing::warn!(error = %e, "Could not read task list at startup"),
    }

    if config.observability.metrics_enabled {
        state = state.with_metrics(metrics::install_recorder()?);
        tracing::info!("Prometheus recorder installed, serving /metrics");
    }

    tracing::info!(
        instance = %state.instance,
        memory_limit_mb = config.memory.limit_mb,
        memory_threshold_percent = config.memory.threshold_percent,
        stress_chunk_mb = config.stress.chunk_mb,
        stress_chunks = config.stress.chunks,
        "Instance initialized"
    );
    Ok(state)
}
