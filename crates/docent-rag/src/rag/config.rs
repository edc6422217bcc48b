//! Retrieval pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for chunking, indexing and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    #[cfg_attr(
        feature = "config",
        arg(long = "chunk-size", env = "DOCENT_CHUNK_SIZE", default_value_t = 1000)
    )]
    pub chunk_size: usize,

    /// Maximum number of characters shared by consecutive chunks.
    #[cfg_attr(
        feature = "config",
        arg(long = "chunk-overlap", env = "DOCENT_CHUNK_OVERLAP", default_value_t = 200)
    )]
    pub chunk_overlap: usize,

    /// Name of the vector index collection holding the chunks.
    #[cfg_attr(
        feature = "config",
        arg(long = "collection", env = "DOCENT_COLLECTION", default_value = "document_chunks")
    )]
    pub collection: String,

    /// Number of chunks retrieved per question.
    #[cfg_attr(
        feature = "config",
        arg(long = "top-k", env = "DOCENT_TOP_K", default_value_t = 3)
    )]
    pub top_k: usize,

    /// Minimum cosine similarity for a chunk to be used. If `None`, no
    /// filtering is applied.
    #[cfg_attr(feature = "config", arg(long = "min-score", env = "DOCENT_MIN_SCORE"))]
    pub min_score: Option<f32>,
}

impl RagConfig {
    /// Validates chunking and retrieval parameters.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk size must be greater than 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.collection.trim().is_empty() {
            return Err(Error::config("collection name must not be empty"));
        }

        if let Some(min_score) = self.min_score
            && !(-1.0..=1.0).contains(&min_score)
        {
            return Err(Error::config(format!(
                "minimum score {min_score} is outside -1.0..=1.0"
            )));
        }

        Ok(())
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            collection: "document_chunks".to_owned(),
            top_k: 3,
            min_score: None,
        }
    }
}
