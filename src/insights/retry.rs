use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How often and how patiently to retry a fallible call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after failed attempt `n` is `backoff_unit * 2^n`.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Every attempt failed; carries the error of the final one.
#[derive(Debug)]
pub struct RetriesExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Exponential backoff without jitter: `unit * 2^attempt`.
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    // Cap the exponent so the multiplication cannot overflow
    let capped_attempt = attempt.min(16);
    unit.saturating_mul(2_u32.saturating_pow(capped_attempt))
}

/// Run `operation` until it succeeds or the policy's attempts run out.
///
/// The operation is re-invoked unchanged on each attempt. The sleep between
/// attempts only suspends the calling task.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetriesExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                warn!(attempt, error = %err, "final attempt failed");
                return Err(RetriesExhausted {
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => {
                let delay = backoff_delay(attempt, policy.backoff_unit);
                warn!(attempt, error = %err, "attempt failed");
                info!(delay_ms = delay.as_millis() as u64, "retrying after backoff");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
