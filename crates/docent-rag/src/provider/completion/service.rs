//! Completion service wrapper with timeout, retries and observability.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ChatPrompt, CompletionError, CompletionProvider, Result};
use crate::provider::{RetryPolicy, TRACING_TARGET};

/// Completion service wrapper.
///
/// Every attempt is bounded by the timeout; elapsing maps to
/// [`CompletionError::Timeout`]. Transient failures are retried according
/// to the [`RetryPolicy`], while authentication, malformed-response and
/// rejected-request failures surface immediately. Cloning is cheap.
#[derive(Clone)]
pub struct CompletionService {
    inner: Arc<dyn CompletionProvider>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl fmt::Debug for CompletionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionService")
            .field("provider", &self.inner.provider_name())
            .field("model", &self.inner.model_name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CompletionService {
    /// Default per-attempt timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Wraps a provider with the default retry policy and timeout.
    pub fn new<P>(provider: P) -> Self
    where
        P: CompletionProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
            retry: RetryPolicy::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the model identifier.
    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    /// Returns the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends the prompt and returns the generated text.
    pub async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            provider = self.inner.provider_name(),
            model = self.model_name(),
            messages = prompt.len(),
            timeout_ms = self.timeout.as_millis(),
            "Requesting completion"
        );

        let result = self
            .retry
            .run("complete", || self.attempt(prompt))
            .await;

        let elapsed = started_at.elapsed();
        match &result {
            Ok(text) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    response_len = text.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Completion received"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Completion failed"
                );
            }
        }

        result
    }

    async fn attempt(&self, prompt: &ChatPrompt) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout {
                after: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCompletionProvider;
    use crate::provider::ChatMessage;

    fn prompt() -> ChatPrompt {
        ChatPrompt::new().with_message(ChatMessage::user("question"))
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_three_times() {
        let provider = MockCompletionProvider::new()
            .with_failure(CompletionError::unavailable("reset"))
            .with_failure(CompletionError::RateLimited { retry_after: None })
            .with_failure(CompletionError::Timeout {
                after: Duration::from_secs(60),
            })
            .with_reply("never reached");
        let service = CompletionService::new(provider.clone());

        let error = service.complete(&prompt()).await.unwrap_err();

        assert!(matches!(error, CompletionError::Timeout { .. }));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_surfaces_immediately() {
        let provider = MockCompletionProvider::new()
            .with_failure(CompletionError::Auth("invalid key".into()))
            .with_reply("never reached");
        let service = CompletionService::new(provider.clone());

        let error = service.complete(&prompt()).await.unwrap_err();

        assert!(matches!(error, CompletionError::Auth(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_rate_limit() {
        let provider = MockCompletionProvider::new()
            .with_failure(CompletionError::RateLimited {
                retry_after: Some(Duration::from_secs(2)),
            })
            .with_reply("answer");
        let service = CompletionService::new(provider.clone());
        let started = tokio::time::Instant::now();

        assert_eq!(service.complete(&prompt()).await.unwrap(), "answer");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = MockCompletionProvider::new()
            .with_delay(Duration::from_secs(120))
            .with_reply("too late");
        let service = CompletionService::new(provider.clone())
            .with_retry(RetryPolicy::none())
            .with_timeout(Duration::from_secs(5));

        let error = service.complete(&prompt()).await.unwrap_err();

        assert_eq!(
            error,
            CompletionError::Timeout {
                after: Duration::from_secs(5)
            }
        );
    }
}
