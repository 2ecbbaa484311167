use std::future::Future;
use std::time::Duration;

use crate::types::common::{BotError, BotResult};

/// Run `op` up to `attempts` times with linear backoff between failures
/// (`backoff_ms × attempt`). The final failure is propagated unchanged.
pub async fn with_retry<T, F, Fut>(
    stage: &str,
    attempts: u32,
    backoff_ms: u64,
    mut op: F,
) -> BotResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = BotResult<T>>,
{
    let mut last_err = None;

    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < attempts {
                    let delay = Duration::from_millis(backoff_ms * attempt as u64);
                    log::warn!(
                        "{}: attempt {}/{} failed: {} (retrying in {}ms)",
                        stage,
                        attempt,
                        attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    log::error!("{}: attempt {}/{} failed: {}", stage, attempt, attempts, e);
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| BotError::Rpc(format!("{}: no attempts made", stage))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_linear_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let start = tokio::time::Instant::now();
        let result = with_retry("quote", 3, 1000, move |_attempt| {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(BotError::QuoteUnavailable("transport".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two failures: delays of 1000ms then 2000ms.
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_failure_propagates_after_exact_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: BotResult<()> = with_retry("quote", 3, 1000, move |_attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BotError::QuoteUnavailable("down".to_string()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(BotError::QuoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_first_attempt_success_skips_backoff() {
        let result = with_retry("quote", 3, 1000, |attempt| async move { Ok(attempt) }).await;
        assert_eq!(result.unwrap(), 1);
    }
}
