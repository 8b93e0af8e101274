//! Failover demonstration subsystem (client side).
//!
//! # Data Flow
//! ```text
//! failover-demo CLI
//!     → wizard.rs (Idle → InstanceDetected → InstanceStressed → FailoverConfirmed)
//!         → client.rs (health / stress / clear through the load balancer)
//!         → resilience (attempt deadline, fixed pauses between attempts)
//!     → outcomes printed for the operator
//! ```
//!
//! # Design Decisions
//! - The wizard never addresses an instance directly; it relies on the
//!   balancer's routing and retries until it lands on the target
//! - `DemoApi` is a trait so the state machine is testable without a network

pub mod client;
pub mod types;
pub mod wizard;

pub use client::{DemoApi, HttpDemoClient};
pub use types::{
    ClearReceipt, DemoError, DemoStep, FailoverCheck, InstanceHealth, StressOutcome, StressReceipt,
};
pub use wizard::{DemoCanceller, FailoverDemo};
