//! OpenAI-compatible remote embedding provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{EmbeddingError, EmbeddingErrorKind, EmbeddingProvider, Result};
use crate::provider::http::{self, StatusClass};
use crate::provider::{RemoteConfig, TRACING_TARGET};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Embedding provider calling `POST {base_url}/embeddings`.
///
/// Each call is a single attempt; retries are applied by
/// [`EmbeddingService`](super::EmbeddingService).
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    dimensions: usize,
}

impl RemoteEmbeddingProvider {
    /// Creates a provider from the shared remote configuration.
    pub fn new(config: &RemoteConfig) -> crate::Result<Self> {
        let endpoint = config.endpoint("embeddings")?;

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            model = %config.embedding_model,
            dimensions = config.embedding_dimensions,
            "Creating remote embedding provider"
        );

        Ok(Self {
            client: config.http_client()?,
            endpoint,
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        })
    }

    fn status_error(status: reqwest::StatusCode, message: String) -> EmbeddingError {
        let kind = match StatusClass::of(status) {
            StatusClass::Auth => EmbeddingErrorKind::Authentication,
            StatusClass::RateLimited => EmbeddingErrorKind::RateLimited,
            StatusClass::Transient => EmbeddingErrorKind::ServiceUnavailable,
            StatusClass::Rejected => EmbeddingErrorKind::InvalidInput,
        };

        EmbeddingError::new(kind).with_message(format!("{status}: {message}"))
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "remote"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = http::retry_after(response.headers());
            let message = http::error_message(response).await;
            return Err(Self::status_error(status, message).with_retry_after(retry_after));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            EmbeddingError::malformed_response(format!("invalid embeddings body: {e}"))
        })?;

        if body.data.len() != texts.len() {
            return Err(EmbeddingError::malformed_response(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        let mut data = body.data;
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/v1")
    }

    fn provider(base_url: &str) -> RemoteEmbeddingProvider {
        let config = RemoteConfig::builder()
            .with_base_url(base_url)
            .unwrap()
            .with_api_key("test-key")
            .with_embedding_dimensions(3usize)
            .build()
            .unwrap();
        RemoteEmbeddingProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn embeddings_are_reordered_by_index() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["input"].as_array().unwrap().len(), 2);
                Json(json!({
                    "data": [
                        { "index": 1, "embedding": [0.0, 1.0, 0.0] },
                        { "index": 0, "embedding": [1.0, 0.0, 0.0] }
                    ]
                }))
            }),
        );
        let provider = provider(&serve(router).await);

        let texts = vec!["a".to_owned(), "b".to_owned()];
        let vectors = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "message": "bad key" } })),
                )
            }),
        );
        let provider = provider(&serve(router).await);

        let error = provider.embed_batch(&["a".to_owned()]).await.unwrap_err();
        assert_eq!(error.kind, EmbeddingErrorKind::Authentication);
        assert!(error.to_string().contains("bad key"));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "5")], "slow down") }),
        );
        let provider = provider(&serve(router).await);

        let error = provider.embed_batch(&["a".to_owned()]).await.unwrap_err();
        assert_eq!(error.kind, EmbeddingErrorKind::RateLimited);
        assert_eq!(error.retry_after, Some(std::time::Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn missing_data_is_malformed() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|| async { Json(json!({ "data": [] })) }),
        );
        let provider = provider(&serve(router).await);

        let error = provider.embed_batch(&["a".to_owned()]).await.unwrap_err();
        assert_eq!(error.kind, EmbeddingErrorKind::MalformedResponse);
    }
}
