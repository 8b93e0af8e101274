//! Task service subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → service.rs (validate, fetch list, mutate, persist)
//!     → store::TaskStore (whole list under one key)
//! ```
//!
//! # Design Decisions
//! - The list is the unit of storage; tasks have no identity outside it
//! - Ids are millisecond timestamps, bumped to stay unique per process
//! - Read-modify-write is not serialized (lost updates are possible)

pub mod service;
pub mod types;

pub use service::TaskService;
pub use types::{Task, TaskError, TaskIdGenerator, TaskResult};
