//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → GET /metrics on the service port (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID and instance id flow through every request span
//! - Gauges are pulled from live state at scrape time, no background poller

pub mod logging;
pub mod metrics;
