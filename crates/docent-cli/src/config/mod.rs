//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── provider: ProviderConfig  # OpenRouter endpoint, models, timeouts
//! ├── rag: RagConfig            # Chunking and retrieval
//! ├── session: SessionConfig    # Prompt history window
//! ├── profile: ProfileArgs      # Preset or individual profile fields
//! └── paths                     # Documents ingested at startup
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! docent --preset "Young Learner" --top-k 5 notes.txt
//!
//! # Or via environment variables
//! OPENROUTER_API_KEY=sk-... DOCENT_TOP_K=5 docent notes.txt
//! ```

mod profile;
mod provider;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use docent_rag::chat::SessionConfig;
use docent_rag::rag::RagConfig;
pub use profile::ProfileArgs;
pub use provider::{EmbeddingBackend, ProviderConfig};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "docent")]
#[command(about = "Ask personalized questions about your documents")]
#[command(version)]
pub struct Cli {
    /// Language model and embedding provider configuration.
    #[clap(flatten)]
    pub provider: ProviderConfig,

    /// Chunking and retrieval configuration.
    #[clap(flatten)]
    pub rag: RagConfig,

    /// Conversation configuration.
    #[clap(flatten)]
    pub session: SessionConfig,

    /// Personalization profile.
    #[clap(flatten)]
    pub profile: ProfileArgs,

    /// `.pdf` or `.txt` documents to ingest before the first question.
    #[arg(value_name = "PATH")]
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    ///
    /// This should be called before parsing CLI arguments so that clap's `env`
    /// feature can pick up values from .env files.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so they do not interleave with answers on stdout.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.rag
            .validate()
            .context("invalid retrieval configuration")?;
        self.provider
            .remote_config()
            .context("invalid provider configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.provider.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            chunk_size = self.rag.chunk_size,
            chunk_overlap = self.rag.chunk_overlap,
            collection = %self.rag.collection,
            top_k = self.rag.top_k,
            min_score = ?self.rag.min_score,
            history_window = self.session.history_window,
            documents = self.paths.len(),
            "Retrieval configuration"
        );
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "fastembed").then_some("fastembed"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
