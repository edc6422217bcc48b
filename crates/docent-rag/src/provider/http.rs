//! Response classification shared by the remote providers.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};

/// Coarse category of a non-success HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusClass {
    /// 401 or 403.
    Auth,
    /// 429.
    RateLimited,
    /// 408 and every 5xx.
    Transient,
    /// Any other client error.
    Rejected,
}

impl StatusClass {
    pub(crate) fn of(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::REQUEST_TIMEOUT => Self::Transient,
            s if s.is_server_error() => Self::Transient,
            _ => Self::Rejected,
        }
    }
}

/// Parses a `retry-after` header given in seconds.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Reads the error message out of a failed response body.
///
/// OpenAI-compatible servers answer `{"error": {"message": "..."}}`; anything
/// else is returned verbatim, truncated.
pub(crate) async fn error_message(response: Response) -> String {
    const MAX_LEN: usize = 256;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or(body);

    let message = message.trim();
    if message.is_empty() {
        return status.to_string();
    }

    message.chars().take(MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn status_classes() {
        assert_eq!(StatusClass::of(StatusCode::UNAUTHORIZED), StatusClass::Auth);
        assert_eq!(StatusClass::of(StatusCode::FORBIDDEN), StatusClass::Auth);
        assert_eq!(StatusClass::of(StatusCode::TOO_MANY_REQUESTS), StatusClass::RateLimited);
        assert_eq!(StatusClass::of(StatusCode::BAD_GATEWAY), StatusClass::Transient);
        assert_eq!(StatusClass::of(StatusCode::REQUEST_TIMEOUT), StatusClass::Transient);
        assert_eq!(StatusClass::of(StatusCode::BAD_REQUEST), StatusClass::Rejected);
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }
}
