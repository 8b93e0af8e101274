//! Memory pressure simulator.
//!
//! Grows the process footprint on command so the health endpoint turns
//! unhealthy and the load balancer fails traffic over to a sibling.
//! The pool is private to one instance and never persisted.

pub mod pool;

pub use pool::{AllocationError, MemoryPressure, StressSnapshot};
