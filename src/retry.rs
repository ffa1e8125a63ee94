//! Bounded retry with exponential backoff for store writes
//!
//! Lifecycle-state writes must never be silently dropped on a flaky network.
//! Only transport failures are retried; `NotFound` and malformed-record
//! errors return immediately so callers can apply their own fallback.

use lodestone_shared::store::StoreError;
use lodestone_shared::sync;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run `op` until it succeeds, a non-retryable error occurs, or the retry
/// budget is exhausted
pub async fn with_backoff<T, F, Fut>(label: &str, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut delay = Duration::from_millis(sync::RETRY_BACKOFF_MS);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(StoreError::Transport(reason)) if attempt < sync::WRITE_MAX_RETRIES => {
                attempt += 1;
                warn!(
                    "{label}: transport failure ({reason}), retry {attempt}/{}",
                    sync::WRITE_MAX_RETRIES
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StoreError::Transport("flaky".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::NotFound("users/u1".into())) }
        })
        .await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Transport("down".into())) }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), sync::WRITE_MAX_RETRIES + 1);
    }
}
