//! Timeout enforcement.
//!
//! Every outbound call has a deadline. Dropping the wrapped future on expiry
//! cancels the in-flight request.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The deadline passed before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {}ms exceeded", .0.as_millis())]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` with a deadline of `limit`.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let result = with_deadline(Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;
        assert_eq!(result, Err(DeadlineExceeded(Duration::from_millis(100))));
        assert_eq!(result.unwrap_err().to_string(), "deadline of 100ms exceeded");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_within_deadline() {
        let result = with_deadline(Duration::from_secs(2), async { 42 }).await;
        assert_eq!(result, Ok(42));
    }
}
