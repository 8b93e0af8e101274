//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! External call (store ping, demo request):
//!     → timeouts.rs (enforce a deadline per call)
//!     → On failure: retries.rs (bounded attempts, fixed pause per outcome)
//!     → backoff.rs (optional jitter on the pause)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retry loops are bounded and report exhaustion instead of erroring out

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{AttemptFailure, RetryPolicy};
pub use timeouts::{with_deadline, DeadlineExceeded};
