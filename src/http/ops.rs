//! Operational endpoints: stress, health, metrics and the service banner.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::health::HealthReport;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

const MIB: usize = 1024 * 1024;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResponse {
    pub status: &'static str,
    pub instance: String,
    pub chunks_allocated: usize,
    #[serde(rename = "allocatedMB")]
    pub allocated_mb: usize,
    #[serde(rename = "rssMB")]
    pub rss_mb: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub status: &'static str,
    pub instance: String,
    pub previous_chunks: usize,
    #[serde(rename = "rssMB")]
    pub rss_mb: u64,
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "instance": &*state.instance,
    }))
}

/// POST /api/stress
pub async fn stress(State(state): State<AppState>) -> Result<Json<StressResponse>, ApiError> {
    tracing::warn!("Starting memory stress");

    let pressure = state.pressure.clone();
    let snapshot = tokio::task::spawn_blocking(move || pressure.stress())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|source| ApiError::Allocation {
            instance: state.instance.to_string(),
            source,
        })?;

    let allocated_mb = snapshot.allocated_bytes / MIB;
    let rss_mb = state.health.resident_mb();
    tracing::warn!(
        chunks = snapshot.block_count,
        allocated_mb,
        rss_mb,
        "Memory allocated"
    );

    Ok(Json(StressResponse {
        status: "memory stress applied",
        instance: state.instance.to_string(),
        chunks_allocated: snapshot.block_count,
        allocated_mb,
        rss_mb,
    }))
}

/// POST /api/stress/clear
pub async fn clear_stress(State(state): State<AppState>) -> Json<ClearResponse> {
    let previous_chunks = state.pressure.clear();
    tracing::info!(previous_chunks, "Memory released");

    Json(ClearResponse {
        status: "memory released",
        instance: state.instance.to_string(),
        previous_chunks,
        rss_mb: state.health.resident_mb(),
    })
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health.evaluate().await;
    (report.status.http_status(), Json(report))
}

/// GET /metrics
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    let Some(handle) = state.metrics.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "metrics disabled" })),
        )
            .into_response();
    };

    metrics::observe_gauges(
        &state.instance,
        state.tasks.cached_count(),
        state.health.resident_bytes(),
        state.pressure.block_count(),
    );

    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
        .into_response()
}
