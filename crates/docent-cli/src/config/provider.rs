//! Language model and embedding provider configuration.

use std::time::Duration;

use anyhow::Context;
use clap::{Args, ValueEnum};
use docent_rag::provider::{
    CompletionService, EmbeddingService, LocalEmbeddingProvider, RemoteCompletionProvider,
    RemoteConfig, RemoteEmbeddingProvider,
};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Where document and question embeddings are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// In-process model; no network access needed.
    #[default]
    Local,
    /// The provider's `/embeddings` endpoint.
    Remote,
}

/// OpenAI-compatible provider configuration (OpenRouter by default).
///
/// # Environment Variables
///
/// - `OPENROUTER_API_BASE` - API base URL
/// - `OPENROUTER_API_KEY` - Bearer token
/// - `SITE_URL` / `SITE_NAME` - attribution headers
/// - `DOCENT_REQUEST_TIMEOUT_SECS` - per-request timeout (default: 60)
/// - `DOCENT_EMBEDDINGS` - `local` or `remote` (default: local)
#[derive(Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ProviderConfig {
    /// API base URL.
    #[arg(long, env = "OPENROUTER_API_BASE", default_value = RemoteConfig::DEFAULT_BASE_URL)]
    pub api_base: String,

    /// API key sent as a bearer token.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Value of the `HTTP-Referer` attribution header.
    #[arg(long, env = "SITE_URL", default_value = RemoteConfig::DEFAULT_SITE_URL)]
    pub site_url: String,

    /// Value of the `X-Title` attribution header.
    #[arg(long, env = "SITE_NAME", default_value = RemoteConfig::DEFAULT_SITE_NAME)]
    pub site_name: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "DOCENT_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Maximum attempts per request, including the first one.
    #[arg(long, env = "DOCENT_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Chat completion model.
    #[arg(long, env = "DOCENT_COMPLETION_MODEL", default_value = RemoteConfig::DEFAULT_COMPLETION_MODEL)]
    pub completion_model: String,

    /// Sampling temperature.
    #[arg(long, env = "DOCENT_TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f32,

    /// Upper bound on generated tokens.
    #[arg(long, env = "DOCENT_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    /// Embedding backend.
    #[arg(long, env = "DOCENT_EMBEDDINGS", value_enum, default_value_t = EmbeddingBackend::Local)]
    pub embeddings: EmbeddingBackend,

    /// Remote embedding model, used with `--embeddings remote`.
    #[arg(long, env = "DOCENT_EMBEDDING_MODEL", default_value = RemoteConfig::DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Dimension of the remote embedding model.
    #[arg(long, env = "DOCENT_EMBEDDING_DIMENSIONS", default_value_t = RemoteConfig::DEFAULT_EMBEDDING_DIMENSIONS)]
    pub embedding_dimensions: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("completion_model", &self.completion_model)
            .field("embeddings", &self.embeddings)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Builds the library configuration shared by both remote providers.
    pub fn remote_config(&self) -> anyhow::Result<RemoteConfig> {
        let mut builder = RemoteConfig::builder()
            .with_base_url(&self.api_base)
            .context("invalid API base URL")?
            .with_site_url(self.site_url.clone())
            .with_site_name(self.site_name.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_max_retries(self.max_retries)
            .with_completion_model(self.completion_model.clone())
            .with_temperature(self.temperature)
            .with_embedding_model(self.embedding_model.clone())
            .with_embedding_dimensions(self.embedding_dimensions);

        if let Some(api_key) = &self.api_key {
            builder = builder.with_api_key(api_key.clone());
        }

        if let Some(max_tokens) = self.max_tokens {
            builder = builder.with_max_tokens(max_tokens);
        }

        Ok(builder.build()?)
    }

    /// Creates the embedding service for the selected backend.
    pub fn create_embedding_service(&self) -> anyhow::Result<EmbeddingService> {
        match self.embeddings {
            EmbeddingBackend::Local => Ok(EmbeddingService::new(local_embedding_provider()?)),
            EmbeddingBackend::Remote => {
                let config = self.remote_config()?;
                let provider = RemoteEmbeddingProvider::new(&config)
                    .context("failed to create remote embedding provider")?;
                Ok(EmbeddingService::with_retry(provider, config.retry_policy()))
            }
        }
    }

    /// Creates the completion service with retry and timeout applied.
    pub fn create_completion_service(&self) -> anyhow::Result<CompletionService> {
        let config = self.remote_config()?;

        if config.api_key.is_none() {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                "No API key configured; set OPENROUTER_API_KEY or pass --api-key"
            );
        }

        let provider = RemoteCompletionProvider::new(&config)
            .context("failed to create completion provider")?;

        Ok(CompletionService::new(provider)
            .with_retry(config.retry_policy())
            .with_timeout(config.timeout))
    }

    /// Logs provider configuration (no sensitive information).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            api_base = %self.api_base,
            api_key_set = self.api_key.is_some(),
            completion_model = %self.completion_model,
            embeddings = ?self.embeddings,
            request_timeout_secs = self.request_timeout_secs,
            max_retries = self.max_retries,
            "Provider configuration"
        );
    }
}

#[cfg(feature = "fastembed")]
fn local_embedding_provider() -> anyhow::Result<LocalEmbeddingProvider> {
    LocalEmbeddingProvider::mini_lm().context("failed to load local embedding model")
}

#[cfg(not(feature = "fastembed"))]
fn local_embedding_provider() -> anyhow::Result<LocalEmbeddingProvider> {
    Ok(LocalEmbeddingProvider::default())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[clap(flatten)]
        provider: ProviderConfig,
    }

    fn parse(args: &[&str]) -> ProviderConfig {
        let argv = std::iter::once("docent").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().provider
    }

    #[test]
    fn remote_config_carries_flags() {
        let provider = parse(&[
            "--api-base",
            "http://localhost:9000/v1",
            "--api-key",
            "sk-test",
            "--request-timeout-secs",
            "5",
        ]);
        let config = provider.remote_config().unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:9000/v1/");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let provider = parse(&["--api-base", "not a url"]);
        assert!(provider.remote_config().is_err());
    }

    #[test]
    fn embeddings_backend_parses() {
        assert_eq!(parse(&["--embeddings", "remote"]).embeddings, EmbeddingBackend::Remote);
    }

    #[test]
    fn debug_redacts_api_key() {
        let provider = parse(&["--api-key", "sk-secret"]);
        assert!(!format!("{provider:?}").contains("sk-secret"));
    }
}
