//! To-do HTTP API with health-driven failover demonstration.

pub mod config;
pub mod demo;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod store;
pub mod stress;
pub mod tasks;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
