//! OpenAI-compatible remote chat completion provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{ChatPrompt, CompletionError, CompletionProvider, Result};
use crate::provider::http::{self, StatusClass};
use crate::provider::{RemoteConfig, TRACING_TARGET};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a ChatPrompt,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Value,
}

/// Extracts the text of a message `content`, which is either a string or a
/// list of typed parts. Non-text parts are skipped.
fn extract_text_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();

            (!texts.is_empty()).then(|| texts.join("\n"))
        }
        _ => None,
    }
}

/// Chat completion provider calling `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct RemoteCompletionProvider {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl RemoteCompletionProvider {
    /// Creates a provider from the shared remote configuration.
    pub fn new(config: &RemoteConfig) -> crate::Result<Self> {
        let endpoint = config.endpoint("chat/completions")?;

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            model = %config.completion_model,
            temperature = config.temperature,
            "Creating remote completion provider"
        );

        Ok(Self {
            client: config.http_client()?,
            endpoint,
            model: config.completion_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> CompletionError {
        if error.is_timeout() {
            CompletionError::Timeout {
                after: self.timeout,
            }
        } else if error.is_connect() {
            CompletionError::unavailable(format!("connection failed: {error}"))
        } else {
            CompletionError::unavailable(error.to_string())
        }
    }

    fn status_error(
        status: reqwest::StatusCode,
        retry_after: Option<Duration>,
        message: String,
    ) -> CompletionError {
        match StatusClass::of(status) {
            StatusClass::Auth => CompletionError::Auth(message),
            StatusClass::RateLimited => CompletionError::RateLimited { retry_after },
            StatusClass::Transient => CompletionError::Unavailable {
                status: Some(status.as_u16()),
                message,
            },
            StatusClass::Rejected => CompletionError::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for RemoteCompletionProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "remote"
    }

    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = http::retry_after(response.headers());
            let message = http::error_message(response).await;
            return Err(Self::status_error(status, retry_after, message));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: CompletionResponse = serde_json::from_slice(&body)
            .map_err(|e| CompletionError::MalformedResponse(format!("invalid body: {e}")))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".into()))?;

        extract_text_content(&message.content).ok_or_else(|| {
            CompletionError::MalformedResponse("response has no text content".into())
        })
    }
}
