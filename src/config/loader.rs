//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply recognized environment variables on top of `config`.
///
/// `lookup` resolves a variable name to its value; the process
/// environment in production, a map in tests.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
    if let Some(port) = lookup("PORT") {
        let port: u16 = parse_var("PORT", &port)?;
        config.server.bind_address = with_port(&config.server.bind_address, port);
    }
    if let Some(id) = lookup("INSTANCE_ID") {
        config.instance.id = id;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = parse_var("LOG_FORMAT", &format)?;
    }
    if let Some(backend) = lookup("STORE_BACKEND") {
        config.store.backend = parse_var("STORE_BACKEND", &backend)?;
    }
    if let Some(url) = lookup("STORE_URL") {
        config.store.url = url;
    }
    if let Some(token) = lookup("STORE_TOKEN") {
        config.store.token = token;
    }
    if let Some(key) = lookup("STORE_KEY") {
        config.store.key = key;
    }
    if let Some(limit) = lookup("MEMORY_LIMIT_MB") {
        config.memory.limit_mb = parse_var("MEMORY_LIMIT_MB", &limit)?;
    }
    if let Some(threshold) = lookup("MEMORY_THRESHOLD_PERCENT") {
        config.memory.threshold_percent = parse_var("MEMORY_THRESHOLD_PERCENT", &threshold)?;
    }
    if let Some(size) = lookup("STRESS_CHUNK_MB") {
        config.stress.chunk_mb = parse_var("STRESS_CHUNK_MB", &size)?;
    }
    if let Some(count) = lookup("STRESS_CHUNKS") {
        config.stress.chunks = parse_var("STRESS_CHUNKS", &count)?;
    }
    Ok(())
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: e.to_string(),
    })
}

/// Replace the port of a bind address, keeping its host.
fn with_port(bind_address: &str, port: u16) -> String {
    match bind_address.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => format!("0.0.0.0:{}", port),
    }
}
