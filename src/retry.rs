//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::ImageError;

/// How many times to try a call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// A policy making at most `max_attempts` calls (at least one), waiting
    /// `base_delay * 2^attempt` after each failed attempt but the last.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Total number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the zero-based `attempt` failed.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are used up.
///
/// `op` receives the zero-based attempt number.
///
/// # Errors
///
/// Returns the first non-transient error, or the last transient one.
pub async fn retry_transient<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ImageError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ImageError>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Err(e) if e.is_transient() && attempt + 1 < policy.max_attempts => {
                let wait = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    wait_secs = wait.as_secs_f64(),
                    error = %e,
                    "call failed, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
