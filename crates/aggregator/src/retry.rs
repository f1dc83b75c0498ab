//! Retry executor for aggregator calls.
//!
//! Wraps any aggregator operation with backoff-based retries:
//! - rate-limit signals get exponential backoff plus uniform jitter,
//! - transient transport failures get a gentler linear backoff,
//! - everything else propagates immediately.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::errors::{AggregatorError, RetryClass};

/// Knobs for the retry executor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts for rate-limited operations (first try included).
    pub max_attempts: u32,
    /// Base delay for the exponential backoff.
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to each backoff delay.
    ///
    /// Jitter keeps a fleet of syncing connections from hammering the
    /// aggregator in lockstep after a shared throttle window expires.
    pub max_jitter: Duration,
    /// Maximum attempts for transient transport failures.
    pub transient_attempts: u32,
    /// Per-attempt delay increment for transient failures.
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(2),
            transient_attempts: 3,
            transient_delay: Duration::from_millis(500),
        }
    }
}

/// Executes aggregator operations under a [`RetryPolicy`].
///
/// # Example
///
/// ```ignore
/// let executor = RetryExecutor::new(RetryPolicy::default());
/// let accounts = executor
///     .execute("get_accounts", || client.get_accounts(&token))
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `op`, retrying according to the error's [`RetryClass`].
    ///
    /// Exhausting the rate-limit attempt budget surfaces
    /// [`AggregatorError::RateLimitExceeded`] so callers can distinguish
    /// "the aggregator never let us through" from an ordinary request
    /// failure and degrade instead of aborting.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        mut op: F,
    ) -> Result<T, AggregatorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AggregatorError>>,
    {
        let mut attempt: u32 = 1;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("'{}' succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => match err.retry_class() {
                    RetryClass::RateLimit => {
                        if attempt >= self.policy.max_attempts {
                            warn!(
                                "'{}' still rate limited after {} attempts, giving up",
                                operation, attempt
                            );
                            return Err(AggregatorError::RateLimitExceeded {
                                operation: operation.to_string(),
                            });
                        }
                        let delay = self.rate_limit_delay(attempt);
                        debug!(
                            "'{}' rate limited (attempt {}/{}), backing off {:?}",
                            operation, attempt, self.policy.max_attempts, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryClass::Transient => {
                        if attempt >= self.policy.transient_attempts {
                            warn!(
                                "'{}' transient failure persisted across {} attempts: {}",
                                operation, attempt, err
                            );
                            return Err(err);
                        }
                        let delay = self.policy.transient_delay * attempt;
                        debug!(
                            "'{}' transient failure (attempt {}/{}), retrying in {:?}: {}",
                            operation, attempt, self.policy.transient_attempts, delay, err
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryClass::Terminal => return Err(err),
                },
            }

            attempt += 1;
        }
    }

    /// `base * 2^(attempt-1)` plus uniform jitter in `[0, max_jitter]`.
    fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.policy.base_delay.saturating_mul(1u32 << exponent);

        let jitter_cap = self.policy.max_jitter.as_millis() as u64;
        let jitter = if jitter_cap == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_cap))
        };

        backoff + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn rate_limited() -> AggregatorError {
        AggregatorError::RateLimited {
            operation: "test_op".to_string(),
        }
    }

    type OpFuture = std::pin::Pin<Box<dyn Future<Output = Result<u32, AggregatorError>> + Send>>;

    /// An op that fails `failures` times with the given error, then succeeds.
    fn flaky_op(
        failures: u32,
        make_err: fn() -> AggregatorError,
    ) -> (Arc<AtomicU32>, impl FnMut() -> OpFuture) {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let op = move || -> OpFuture {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n < failures {
                    Err(make_err())
                } else {
                    Ok(n)
                }
            })
        };
        (calls, op)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_eventually_succeeds_within_delay_bounds() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let failures = 3u32;
        let (calls, op) = flaky_op(failures, rate_limited);

        let start = Instant::now();
        let result = executor.execute("test_op", op).await;
        let elapsed = start.elapsed();

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), failures + 1);

        // base*(2^N - 1) <= elapsed <= base*(2^N - 1) + N*max_jitter
        let base = Duration::from_secs(1);
        let min_total = base * (2u32.pow(failures) - 1);
        let max_total = min_total + Duration::from_secs(2) * failures;
        assert!(
            elapsed >= min_total,
            "elapsed {:?} below minimum {:?}",
            elapsed,
            min_total
        );
        assert!(
            elapsed <= max_total + Duration::from_millis(50),
            "elapsed {:?} above maximum {:?}",
            elapsed,
            max_total
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_rate_limit_surfaces_typed_error() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let (calls, op) = flaky_op(u32::MAX, rate_limited);

        let result: Result<u32, _> = executor.execute("test_op", op).await;

        assert!(matches!(
            result,
            Err(AggregatorError::RateLimitExceeded { ref operation }) if operation == "test_op"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retried_with_linear_backoff() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let (calls, op) = flaky_op(2, || AggregatorError::Timeout {
            operation: "test_op".to_string(),
        });

        let start = Instant::now();
        let result = executor.execute("test_op", op).await;
        let elapsed = start.elapsed();

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500ms * 1 + 500ms * 2
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed <= Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_gives_up_after_fewer_attempts() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let (calls, op) = flaky_op(u32::MAX, || AggregatorError::ConnectionReset {
            operation: "test_op".to_string(),
        });

        let result: Result<u32, _> = executor.execute("test_op", op).await;

        assert!(matches!(
            result,
            Err(AggregatorError::ConnectionReset { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_error_propagates_without_retry() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let (calls, op) = flaky_op(u32::MAX, || AggregatorError::InvalidCredentials {
            code: "ITEM_LOGIN_REQUIRED".to_string(),
        });

        let result: Result<u32, _> = executor.execute("test_op", op).await;

        assert!(matches!(
            result,
            Err(AggregatorError::InvalidCredentials { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let (calls, op) = flaky_op(0, rate_limited);

        let result = executor.execute("test_op", op).await;

        assert_eq!(result.unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
