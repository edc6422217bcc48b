//! Text embedding providers.

mod error;
mod local;
mod remote;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

pub use self::error::{BoxedError, EmbeddingError, EmbeddingErrorKind};
pub use self::local::{HashingEmbedder, LocalEmbeddingProvider};
pub use self::remote::RemoteEmbeddingProvider;
use super::{RetryPolicy, TRACING_TARGET};

/// Result type for embedding operations.
pub type Result<T, E = EmbeddingError> = std::result::Result<T, E>;

/// Capability interface for turning text into fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// each of length [`dimensions`](Self::dimensions). The dimension is fixed
/// for the lifetime of the provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the embedding model.
    fn model_name(&self) -> &str;

    /// Name of the backend (`local`, `remote`, ...).
    fn provider_name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Embeds a non-empty batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embedding service wrapper with validation, retries and observability.
///
/// Every provider gets the same guarantees through this wrapper: empty
/// batches are rejected before reaching the provider, transient failures are
/// retried, and results with the wrong count or dimension are reported as
/// [`EmbeddingErrorKind::MalformedResponse`]. Cloning is cheap.
#[derive(Clone)]
pub struct EmbeddingService {
    inner: Arc<dyn EmbeddingProvider>,
    retry: RetryPolicy,
}

impl fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("provider", &self.inner.provider_name())
            .field("model", &self.inner.model_name())
            .field("dimensions", &self.inner.dimensions())
            .finish_non_exhaustive()
    }
}

impl EmbeddingService {
    /// Wraps a provider with the default retry policy.
    pub fn new<P>(provider: P) -> Self
    where
        P: EmbeddingProvider + 'static,
    {
        Self::with_retry(provider, RetryPolicy::default())
    }

    /// Wraps a provider with a custom retry policy.
    pub fn with_retry<P>(provider: P, retry: RetryPolicy) -> Self
    where
        P: EmbeddingProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
            retry,
        }
    }

    /// Returns the model identifier.
    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    /// Returns the backend name.
    pub fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    /// Returns the vector dimension.
    pub fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    /// Embeds a batch of texts, one vector per text in input order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(EmbeddingError::invalid_input("cannot embed an empty batch"));
        }

        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            provider = self.provider_name(),
            model = self.model_name(),
            batch_size = texts.len(),
            "Embedding batch"
        );

        let result = self
            .retry
            .run("embed_batch", || self.inner.embed_batch(texts))
            .await
            .and_then(|vectors| self.validate(texts.len(), vectors));

        let elapsed = started_at.elapsed();
        match &result {
            Ok(_) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    batch_size = texts.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Batch embedded"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    provider = self.provider_name(),
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Embedding failed"
                );
            }
        }

        result
    }

    /// Embeds a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_owned()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::malformed_response("provider returned no vector"))
    }

    fn validate(&self, expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
        if vectors.len() != expected {
            return Err(EmbeddingError::malformed_response(format!(
                "expected {expected} vectors, got {}",
                vectors.len()
            )));
        }

        let dimensions = self.dimensions();
        if let Some((index, vector)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimensions)
        {
            return Err(EmbeddingError::malformed_response(format!(
                "vector {index} has dimension {}, expected {dimensions}",
                vector.len()
            )));
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct ShortProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn model_name(&self) -> &str {
            "short"
        }

        fn provider_name(&self) -> &str {
            "test"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![0.0; 4]).collect())
        }
    }

    struct WrongDimensionProvider;

    #[async_trait]
    impl EmbeddingProvider for WrongDimensionProvider {
        fn model_name(&self) -> &str {
            "wide"
        }

        fn provider_name(&self) -> &str {
            "test"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 5]).collect())
        }
    }

    struct FlakyProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyProvider {
        fn model_name(&self) -> &str {
            "flaky"
        }

        fn provider_name(&self) -> &str {
            "test"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(EmbeddingError::new(EmbeddingErrorKind::ServiceUnavailable));
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let service = EmbeddingService::new(LocalEmbeddingProvider::default());
        let error = service.embed_batch(&[]).await.unwrap_err();
        assert_eq!(error.kind, EmbeddingErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn short_result_is_malformed() {
        let service = EmbeddingService::new(ShortProvider);
        let texts = vec!["a".to_owned(), "b".to_owned()];

        let error = service.embed_batch(&texts).await.unwrap_err();
        assert_eq!(error.kind, EmbeddingErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn wrong_dimension_is_malformed() {
        let service = EmbeddingService::new(WrongDimensionProvider);

        let error = service.embed_one("a").await.unwrap_err();
        assert_eq!(error.kind, EmbeddingErrorKind::MalformedResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let service = EmbeddingService::new(FlakyProvider {
            calls: AtomicU32::new(0),
        });

        let vector = service.embed_one("hello").await.unwrap();
        assert_eq!(vector, vec![1.0, 0.0]);
    }
}
