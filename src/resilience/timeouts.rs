//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap external calls (store ping, demo requests) with a deadline
//! - Keep timeout errors distinct from the call's own errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped future did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `future` with an upper bound on its duration.
pub async fn with_deadline<F, T>(limit: Duration, future: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_in_time() {
        let out = with_deadline(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_hung_future() {
        let limit = Duration::from_millis(20);
        let out = with_deadline(limit, std::future::pending::<()>()).await;
        assert_eq!(out, Err(DeadlineExceeded(limit)));
    }
}
