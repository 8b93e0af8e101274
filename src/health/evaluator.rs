//! Instance health evaluation.
//!
//! # Responsibilities
//! - Sample resident memory and compare it to the configured threshold
//! - Ping the task store
//! - Produce the report the load balancer routes on
//!
//! # Status Mapping
//! ```text
//! store unreachable              → ERROR      (500)
//! store ok, memory over threshold → UNHEALTHY  (503)
//! store ok, memory under threshold → OK        (200)
//! ```
//!
//! # Design Decisions
//! - Memory is sampled before the store ping so a slow store does not skew it
//! - Evaluation allocates nothing proportional to memory use
//! - Threshold and limit come from config, never from the runtime environment

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MemoryConfig;
use crate::health::probe::MemoryProbe;
use crate::resilience::timeouts::with_deadline;
use crate::stress::MemoryPressure;
use crate::tasks::TaskService;

const MIB: f64 = 1024.0 * 1024.0;

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Ok,
    Unhealthy,
    Error,
}

impl HealthStatus {
    /// HTTP status the health endpoint answers with.
    pub fn http_status(self) -> StatusCode {
        match self {
            HealthStatus::Ok => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Store connectivity as seen by the last ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Connected,
    Disconnected,
}

/// Memory section of the health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryReport {
    #[serde(rename = "rssMB")]
    pub rss_mb: u64,
    #[serde(rename = "limitMB")]
    pub limit_mb: u64,
    pub percent: u64,
    pub threshold: u8,
    #[serde(rename = "stressChunks")]
    pub stress_chunks: usize,
}

/// Health endpoint body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub instance: String,
    pub api: &'static str,
    pub store: StoreState,
    pub memory: MemoryReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Memory limit and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryPolicy {
    pub limit_mb: u64,
    pub threshold_percent: u8,
}

impl MemoryPolicy {
    /// Threshold in MB (may be fractional, e.g. 409.6 for 512 MB at 80%).
    pub fn threshold_mb(&self) -> f64 {
        self.limit_mb as f64 * f64::from(self.threshold_percent) / 100.0
    }

    /// Bytes to whole MB, rounded to nearest.
    pub fn to_mb(bytes: u64) -> u64 {
        (bytes as f64 / MIB).round() as u64
    }

    /// Share of the limit in whole percent.
    pub fn percent(&self, rss_mb: u64) -> u64 {
        if self.limit_mb == 0 {
            return 0;
        }
        (rss_mb as f64 / self.limit_mb as f64 * 100.0).round() as u64
    }

    /// Strictly below the threshold counts as healthy.
    pub fn is_healthy(&self, rss_mb: u64) -> bool {
        (rss_mb as f64) < self.threshold_mb()
    }
}

impl From<&MemoryConfig> for MemoryPolicy {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            limit_mb: config.limit_mb,
            threshold_percent: config.threshold_percent,
        }
    }
}

/// Computes the health report of one instance.
pub struct HealthEvaluator {
    instance: String,
    policy: MemoryPolicy,
    probe: Arc<dyn MemoryProbe>,
    pressure: Arc<MemoryPressure>,
    tasks: Arc<TaskService>,
    store_timeout: Duration,
}

impl HealthEvaluator {
    pub fn new(
        instance: impl Into<String>,
        policy: MemoryPolicy,
        probe: Arc<dyn MemoryProbe>,
        pressure: Arc<MemoryPressure>,
        tasks: Arc<TaskService>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            instance: instance.into(),
            policy,
            probe,
            pressure,
            tasks,
            store_timeout,
        }
    }

    /// Current resident memory in bytes.
    pub fn resident_bytes(&self) -> u64 {
        self.probe.resident_bytes()
    }

    /// Current resident memory in whole MB.
    pub fn resident_mb(&self) -> u64 {
        MemoryPolicy::to_mb(self.resident_bytes())
    }

    /// Snapshot of memory usage against the policy.
    pub fn memory_report(&self) -> MemoryReport {
        let rss_mb = self.resident_mb();
        MemoryReport {
            rss_mb,
            limit_mb: self.policy.limit_mb,
            percent: self.policy.percent(rss_mb),
            threshold: self.policy.threshold_percent,
            stress_chunks: self.pressure.block_count(),
        }
    }

    /// Evaluate memory and store connectivity.
    pub async fn evaluate(&self) -> HealthReport {
        let memory = self.memory_report();
        let healthy = self.policy.is_healthy(memory.rss_mb);

        let ping = with_deadline(self.store_timeout, self.tasks.ping_store()).await;
        let (status, store, error) = match ping {
            Ok(Ok(())) if healthy => (HealthStatus::Ok, StoreState::Connected, None),
            Ok(Ok(())) => {
                tracing::warn!(
                    rss_mb = memory.rss_mb,
                    memory_percent = memory.percent,
                    "Health check: memory over threshold, reporting unhealthy"
                );
                (HealthStatus::Unhealthy, StoreState::Connected, None)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Health check: store unreachable");
                (HealthStatus::Error, StoreState::Disconnected, Some(e.to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, "Health check: store ping timed out");
                (HealthStatus::Error, StoreState::Disconnected, Some(e.to_string()))
            }
        };

        HealthReport {
            status,
            instance: self.instance.clone(),
            api: "running",
            store,
            memory,
            error,
            timestamp: Utc::now(),
        }
    }
}
