//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/health
//!     → evaluator.rs
//!         → probe.rs (resident memory of this process)
//!         → MemoryPolicy (threshold comparison)
//!         → TaskService::ping_store (store connectivity)
//!     → HealthReport (OK 200 / UNHEALTHY 503 / ERROR 500)
//!     → external load balancer routes on the status code
//! ```
//!
//! # Design Decisions
//! - Binary verdict per instance; no hysteresis here (the balancer owns it)
//! - Store failure is reported separately from memory pressure

pub mod evaluator;
pub mod probe;

pub use evaluator::{
    HealthEvaluator, HealthReport, HealthStatus, MemoryPolicy, MemoryReport, StoreState,
};
pub use probe::{FixedProbe, MemoryProbe, ProcessProbe};
