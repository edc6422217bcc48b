//! Retrieval-augmented generation pipeline.
//!
//! Documents flow through the [`DocumentChunker`], the
//! [`EmbeddingService`](crate::provider::EmbeddingService) and into a
//! [`VectorIndex`]; questions are embedded and matched against the index by
//! the [`RetrievalEngine`].
//!
//! # Modules
//!
//! - [`splitter`] - Text splitting into overlapping chunks
//! - [`index`] - Vector index trait and the in-memory implementation
//! - [`loader`] - `.txt` / `.pdf` document loading
//!
//! # Example
//!
//! ```no_run
//! use docent_rag::provider::{EmbeddingService, LocalEmbeddingProvider};
//! use docent_rag::rag::{Document, RagConfig, RetrievalEngine};
//!
//! # async fn example() -> docent_rag::Result<()> {
//! let embeddings = EmbeddingService::new(LocalEmbeddingProvider::default());
//! let engine = RetrievalEngine::new(embeddings, RagConfig::default())?;
//!
//! engine
//!     .ingest(&[Document::new("notes.txt", "Photosynthesis happens in chloroplasts.")])
//!     .await?;
//! let context = engine.retrieve("Where does photosynthesis happen?", 3).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
pub mod index;
pub mod loader;
pub mod splitter;

pub use self::config::RagConfig;
pub use self::engine::{IngestSummary, RetrievalEngine, RetrievedChunk};
pub use self::index::{EmbeddedChunk, MemoryIndex, ScoredChunk, VectorIndex};
pub use self::loader::{Document, DocumentFormat, DocumentLoader};
pub use self::splitter::{DocumentChunk, DocumentChunker};

/// Tracing target for retrieval operations.
pub const TRACING_TARGET: &str = "docent_rag::rag";
