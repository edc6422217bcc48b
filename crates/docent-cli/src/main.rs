#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod repl;

use std::process;

use anyhow::Context;
use docent_rag::chat::ConversationSession;
use docent_rag::rag::RetrievalEngine;
use tokio::io::BufReader;

use crate::config::Cli;
use crate::repl::Repl;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "docent_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "docent_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "docent_cli::config";
pub const TRACING_TARGET_REPL: &str = "docent_cli::repl";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.validate()?;
    cli.log();

    let embeddings = cli
        .provider
        .create_embedding_service()
        .context("failed to create embedding service")?;
    let engine = RetrievalEngine::new(embeddings, cli.rag.clone())
        .context("failed to create retrieval engine")?;

    if !cli.paths.is_empty() {
        let summary = engine
            .ingest_paths(&cli.paths)
            .await
            .context("failed to ingest documents")?;

        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            documents = summary.documents,
            chunks = summary.chunks,
            "documents ingested"
        );
    }

    let completions = cli
        .provider
        .create_completion_service()
        .context("failed to create completion service")?;
    let profile = cli
        .profile
        .resolve()
        .context("invalid personalization profile")?;

    let session = ConversationSession::new(engine, completions)
        .with_profile(profile)
        .with_config(cli.session.clone());

    let mut repl = Repl::new(session, tokio::io::stdout());
    repl.run(BufReader::new(tokio::io::stdin())).await
}
