//! Bounded retries with exponential backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use super::TRACING_TARGET;

/// Failures that can tell whether repeating the request may succeed.
pub trait Retryable {
    /// Returns true if the failure is transient.
    fn is_transient(&self) -> bool;

    /// Server-provided hint for how long to wait before the next attempt.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Retry policy shared by the embedding and completion services.
///
/// The delay before attempt `n + 1` is `initial_backoff * 2^(n - 1)`, capped at
/// `max_backoff`. A `retry-after` hint from the server replaces the computed
/// delay but is capped the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Default number of attempts, including the first one.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Creates a policy with the given number of attempts (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Sets the delay before the first retry.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the upper bound for any single delay.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Returns the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Returns the delay to apply after `error` on the given attempt.
    pub fn delay_for<E: Retryable>(&self, error: &E, attempt: u32) -> Duration {
        error
            .retry_after()
            .map(|hint| hint.min(self.max_backoff))
            .unwrap_or_else(|| self.backoff(attempt))
    }

    /// Runs `operation`, retrying transient failures until the attempt budget
    /// is exhausted. Permanent failures are returned immediately.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        E: Retryable + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(&error, attempt);

                    tracing::warn!(
                        target: TRACING_TARGET,
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "Transient failure, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}
