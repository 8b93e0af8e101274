//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for one
//! service instance. All types derive Serde traits for deserialization
//! from config files; environment overrides are applied by the loader.

use serde::{Deserialize, Serialize};

/// Root configuration for a task API instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings (bind address, limits, timeouts).
    pub server: ServerConfig,

    /// Identity of this replica.
    pub instance: InstanceConfig,

    /// External key-value store holding the task list.
    pub store: StoreConfig,

    /// Memory limit and health threshold.
    pub memory: MemoryConfig,

    /// Memory pressure simulator sizing.
    pub stress: StressConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Answer cross-origin requests from any origin.
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
            cors_enabled: true,
        }
    }
}

/// Replica identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Identity reported by health and stress responses.
    pub id: String,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self { id: "1".to_string() }
    }
}

/// Which key-value store implementation backs the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map. Replicas do not share tasks.
    Memory,
    /// Upstash Redis over its REST protocol.
    Upstash,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "upstash" => Ok(StoreBackend::Upstash),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store implementation.
    pub backend: StoreBackend,

    /// REST endpoint of the store (required for `upstash`).
    pub url: String,

    /// Bearer token for the REST endpoint.
    pub token: String,

    /// Key holding the serialized task list.
    pub key: String,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: String::new(),
            token: String::new(),
            key: "todos".to_string(),
            timeout_ms: 2000,
        }
    }
}

/// Memory health policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memory budget of the instance in MB.
    pub limit_mb: u64,

    /// Percentage of the limit at which the instance reports unhealthy.
    pub threshold_percent: u8,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            limit_mb: 512,
            threshold_percent: 80,
        }
    }
}

/// Memory pressure simulator sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StressConfig {
    /// Size of each allocated block in MiB.
    pub chunk_mb: usize,

    /// Blocks allocated per stress call.
    pub chunks: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        // 8 x 50 MiB puts a 512 MB instance right at its 80% threshold.
        Self {
            chunk_mb: 50,
            chunks: 8,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Expose `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
