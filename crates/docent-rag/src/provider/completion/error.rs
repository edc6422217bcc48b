//! Typed completion failures.

use std::time::Duration;

use crate::provider::Retryable;

/// Failure of a single completion request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The request did not complete within the timeout.
    #[error("request timed out after {}s", .after.as_secs_f32())]
    Timeout { after: Duration },

    /// The provider is throttling requests.
    #[error("rate limited{}", .retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// Credentials were missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The provider or the network is temporarily unavailable.
    #[error("service unavailable{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Unavailable { status: Option<u16>, message: String },

    /// The request was refused and repeating it will not help.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl CompletionError {
    /// Returns true for the categories worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Unavailable { .. }
        )
    }

    /// Creates a transport-level unavailability error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            status: None,
            message: message.into(),
        }
    }
}

impl Retryable for CompletionError {
    fn is_transient(&self) -> bool {
        CompletionError::is_transient(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
