//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, threshold within 1..=100)
//! - Check that the selected store backend has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{AppConfig, StoreBackend};

/// Largest accepted stress block, in MB.
pub const MAX_CHUNK_MB: usize = 4096;
/// Largest accepted number of blocks per stress call.
pub const MAX_CHUNKS: usize = 1024;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }

    if config.instance.id.trim().is_empty() {
        errors.push(ValidationError::new("instance.id", "must not be empty"));
    }

    if config.memory.limit_mb == 0 {
        errors.push(ValidationError::new("memory.limit_mb", "must be greater than 0"));
    }
    if !(1..=100).contains(&config.memory.threshold_percent) {
        errors.push(ValidationError::new(
            "memory.threshold_percent",
            format!("{} is outside 1..=100", config.memory.threshold_percent),
        ));
    }

    if !(1..=MAX_CHUNK_MB).contains(&config.stress.chunk_mb) {
        errors.push(ValidationError::new(
            "stress.chunk_mb",
            format!("{} is outside 1..={}", config.stress.chunk_mb, MAX_CHUNK_MB),
        ));
    }
    if !(1..=MAX_CHUNKS).contains(&config.stress.chunks) {
        errors.push(ValidationError::new(
            "stress.chunks",
            format!("{} is outside 1..={}", config.stress.chunks, MAX_CHUNKS),
        ));
    }

    if config.store.key.is_empty() {
        errors.push(ValidationError::new("store.key", "must not be empty"));
    }
    if config.store.timeout_ms == 0 {
        errors.push(ValidationError::new("store.timeout_ms", "must be greater than 0"));
    }
    if config.store.backend == StoreBackend::Upstash {
        match url::Url::parse(&config.store.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                "store.url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "store.url",
                format!("invalid URL '{}': {}", config.store.url, e),
            )),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
