//! HTTP endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span, completion log + metrics)
//!     → todos.rs (task CRUD) | ops.rs (stress, health, metrics)
//!     → error.rs (failures rendered as JSON)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Handlers hold no state of their own; everything lives in `AppState`
//! - Health answers with the status code the load balancer acts on

pub mod error;
pub mod ops;
pub mod request;
pub mod server;
pub mod todos;

pub use error::ApiError;
pub use request::{X_INSTANCE_ID, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
