//! Connection settings for OpenAI-compatible HTTP endpoints.

use std::fmt;
use std::time::Duration;

use derive_builder::Builder;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::RetryPolicy;
use crate::{Error, Result};

/// Configuration shared by the remote embedding and completion providers.
///
/// The defaults target OpenRouter. Any server that speaks the OpenAI
/// `/embeddings` and `/chat/completions` wire format can be used by changing
/// the base URL.
#[derive(Clone, Builder)]
#[builder(
    name = "RemoteConfigBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct RemoteConfig {
    /// Base URL of the API, always ending with a slash.
    #[builder(setter(custom), default = "RemoteConfig::default_base_url()")]
    pub base_url: Url,
    /// Bearer token sent with every request.
    #[builder(default)]
    pub api_key: Option<String>,
    /// Value of the `HTTP-Referer` header.
    #[builder(default = "RemoteConfig::DEFAULT_SITE_URL.to_owned()")]
    pub site_url: String,
    /// Value of the `X-Title` header.
    #[builder(default = "RemoteConfig::DEFAULT_SITE_NAME.to_owned()")]
    pub site_name: String,
    /// Per-request timeout.
    #[builder(default = "Duration::from_secs(60)")]
    pub timeout: Duration,
    /// Connection timeout.
    #[builder(default = "Duration::from_secs(10)")]
    pub connect_timeout: Duration,
    /// Maximum attempts per request, including the first one.
    #[builder(default = "RetryPolicy::DEFAULT_MAX_ATTEMPTS")]
    pub max_retries: u32,
    /// Embedding model identifier.
    #[builder(default = "RemoteConfig::DEFAULT_EMBEDDING_MODEL.to_owned()")]
    pub embedding_model: String,
    /// Dimension of the vectors returned by the embedding model.
    #[builder(default = "RemoteConfig::DEFAULT_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: usize,
    /// Chat completion model identifier.
    #[builder(default = "RemoteConfig::DEFAULT_COMPLETION_MODEL.to_owned()")]
    pub completion_model: String,
    /// Sampling temperature for completions.
    #[builder(default = "0.7")]
    pub temperature: f32,
    /// Upper bound on generated tokens.
    #[builder(default)]
    pub max_tokens: Option<u32>,
    /// User agent string for requests.
    #[builder(default = "RemoteConfig::default_user_agent()")]
    pub user_agent: String,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("site_url", &self.site_url)
            .field("site_name", &self.site_name)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("embedding_model", &self.embedding_model)
            .field("completion_model", &self.completion_model)
            .finish_non_exhaustive()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            site_url: Self::DEFAULT_SITE_URL.to_owned(),
            site_name: Self::DEFAULT_SITE_NAME.to_owned(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_retries: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            embedding_model: Self::DEFAULT_EMBEDDING_MODEL.to_owned(),
            embedding_dimensions: Self::DEFAULT_EMBEDDING_DIMENSIONS,
            completion_model: Self::DEFAULT_COMPLETION_MODEL.to_owned(),
            temperature: 0.7,
            max_tokens: None,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl RemoteConfig {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/";
    /// Default `HTTP-Referer` value.
    pub const DEFAULT_SITE_URL: &str = "http://localhost:8501";
    /// Default `X-Title` value.
    pub const DEFAULT_SITE_NAME: &str = "Personalized RAG Chatbot";
    /// Default embedding model.
    pub const DEFAULT_EMBEDDING_MODEL: &str = "openai/text-embedding-ada-002";
    /// Dimension of the default embedding model.
    pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
    /// Default chat completion model.
    pub const DEFAULT_COMPLETION_MODEL: &str = "mistralai/mistral-7b-instruct";

    /// Creates a new configuration builder.
    pub fn builder() -> RemoteConfigBuilder {
        RemoteConfigBuilder::default()
    }

    fn default_base_url() -> Url {
        Url::parse(Self::DEFAULT_BASE_URL).expect("valid default base URL")
    }

    fn default_user_agent() -> String {
        format!("docent/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Returns the retry policy derived from `max_retries`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }

    /// Resolves an endpoint path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("invalid endpoint '{path}': {e}")))
    }

    /// Builds an HTTP client carrying the authentication and attribution headers.
    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();

        if let Some(api_key) = &self.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| Error::config(format!("invalid API key: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let referer = HeaderValue::from_str(&self.site_url)
            .map_err(|e| Error::config(format!("invalid site URL header: {e}")))?;
        headers.insert(HeaderName::from_static("http-referer"), referer);

        let title = HeaderValue::from_str(&self.site_name)
            .map_err(|e| Error::config(format!("invalid site name header: {e}")))?;
        headers.insert(HeaderName::from_static("x-title"), title);

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
    }
}

impl RemoteConfigBuilder {
    /// Sets the base URL of the API.
    ///
    /// A trailing slash is added when missing so that endpoint paths are
    /// appended rather than replacing the last segment.
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        let mut parsed = Url::parse(url)
            .map_err(|e| Error::config(format!("invalid base URL '{url}': {e}")))?;

        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        self.base_url = Some(parsed);
        Ok(self)
    }

    fn validate_config(&self) -> std::result::Result<(), String> {
        if let Some(timeout) = &self.timeout
            && timeout.is_zero()
        {
            return Err("timeout must be greater than 0".to_string());
        }

        if let Some(dimensions) = &self.embedding_dimensions
            && *dimensions == 0
        {
            return Err("embedding dimensions must be greater than 0".to_string());
        }

        if let Some(temperature) = &self.temperature
            && !(0.0..=2.0).contains(temperature)
        {
            return Err(format!("temperature {temperature} is outside 0.0..=2.0"));
        }

        if let Some(Some(api_key)) = &self.api_key
            && api_key.trim().is_empty()
        {
            return Err("API key must not be blank".to_string());
        }

        Ok(())
    }
}

impl From<RemoteConfigBuilderError> for Error {
    fn from(error: RemoteConfigBuilderError) -> Self {
        Error::config(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RemoteConfig::default();

        assert_eq!(config.base_url.as_str(), "https://openrouter.ai/api/v1/");
        assert_eq!(config.site_url, "http://localhost:8501");
        assert_eq!(config.site_name, "Personalized RAG Chatbot");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.embedding_dimensions, 1536);
        assert_eq!(config.completion_model, "mistralai/mistral-7b-instruct");
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = RemoteConfig::builder()
            .with_base_url("http://localhost:8080/v1")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            config.endpoint("embeddings").unwrap().as_str(),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn invalid_base_url() {
        assert!(RemoteConfig::builder().with_base_url("not a url").is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = RemoteConfig::builder()
            .with_timeout(Duration::ZERO)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let result = RemoteConfig::builder().with_api_key("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = RemoteConfig::builder()
            .with_api_key("sk-secret")
            .build()
            .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn builder_error_converts_to_config_error() {
        let error: Error = RemoteConfig::builder()
            .with_embedding_dimensions(0usize)
            .build()
            .unwrap_err()
            .into();

        assert!(matches!(error, Error::Config(_)));
    }
}
