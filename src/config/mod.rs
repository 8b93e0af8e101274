//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PORT, INSTANCE_ID, STORE_URL, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → consumed once at startup to build the service context
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::{
    InstanceConfig, LogFormat, MemoryConfig, ObservabilityConfig, ServerConfig, StoreBackend,
    StoreConfig, StressConfig,
};
