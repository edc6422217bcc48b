//! Error types for embedding operations.

use std::fmt;
use std::time::Duration;

use crate::provider::Retryable;

/// Boxed error used as the source of an [`EmbeddingError`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by embedding providers.
///
/// Carries the failure category, an optional human-readable message and the
/// underlying cause. Providers never pad or truncate results; any mismatch
/// between inputs and vectors is reported as [`EmbeddingErrorKind::MalformedResponse`].
#[derive(Debug, thiserror::Error)]
#[error("{}", .message.as_ref().map(|m| format!("{}: {}", .kind, m)).unwrap_or_else(|| .kind.to_string()))]
pub struct EmbeddingError {
    /// The failure category.
    pub kind: EmbeddingErrorKind,
    /// Additional context.
    pub message: Option<String>,
    /// Server-provided delay before retrying.
    pub retry_after: Option<Duration>,
    /// Underlying cause.
    #[source]
    pub source: Option<BoxedError>,
}

impl EmbeddingError {
    /// Creates a new error with the given kind.
    pub fn new(kind: EmbeddingErrorKind) -> Self {
        Self {
            kind,
            message: None,
            retry_after: None,
            source: None,
        }
    }

    /// Attaches a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches a retry-after hint.
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns true if the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            EmbeddingErrorKind::RateLimited
                | EmbeddingErrorKind::NetworkError
                | EmbeddingErrorKind::Timeout
                | EmbeddingErrorKind::ServiceUnavailable
        )
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(EmbeddingErrorKind::InvalidInput).with_message(message)
    }

    /// Creates a malformed response error.
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(EmbeddingErrorKind::MalformedResponse).with_message(message)
    }

    /// Creates a model load error.
    pub fn model_load_failed(message: impl Into<String>) -> Self {
        Self::new(EmbeddingErrorKind::ModelLoadFailed).with_message(message)
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            EmbeddingErrorKind::Timeout
        } else if error.is_decode() {
            EmbeddingErrorKind::MalformedResponse
        } else {
            EmbeddingErrorKind::NetworkError
        };

        Self::new(kind)
            .with_message(error.to_string())
            .with_source(error)
    }
}

impl Retryable for EmbeddingError {
    fn is_transient(&self) -> bool {
        self.is_retryable()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

/// Categories of embedding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingErrorKind {
    /// Credentials were rejected.
    Authentication,
    /// The input was rejected (empty batch, oversized text, bad request).
    InvalidInput,
    /// The model could not be initialized.
    ModelLoadFailed,
    /// The quota or rate limit was exceeded.
    RateLimited,
    /// Transport failure.
    NetworkError,
    /// The request did not complete in time.
    Timeout,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
    /// Wrong vector count, wrong dimension or missing data.
    MalformedResponse,
    /// Any other provider-side failure.
    InternalError,
}

impl fmt::Display for EmbeddingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "Authentication failed"),
            Self::InvalidInput => write!(f, "Invalid input provided"),
            Self::ModelLoadFailed => write!(f, "Model loading failed"),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
            Self::NetworkError => write!(f, "Network error occurred"),
            Self::Timeout => write!(f, "Operation timed out"),
            Self::ServiceUnavailable => write!(f, "Service unavailable"),
            Self::MalformedResponse => write!(f, "Malformed response"),
            Self::InternalError => write!(f, "Internal provider error"),
        }
    }
}
