//! Vector index abstraction.
//!
//! A [`VectorIndex`] stores named collections of embedded chunks. A
//! collection exists from its first population until it is cleared, and
//! every vector in it shares one dimension.

mod memory;
mod similarity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use self::memory::MemoryIndex;
pub use self::similarity::cosine_similarity;
use super::DocumentChunk;
use crate::Result;

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    /// Creates a new embedded chunk.
    pub fn new(chunk: DocumentChunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    /// Cosine similarity to the query, in `-1.0..=1.0`.
    pub score: f32,
}

/// Storage of embedded chunks with similarity search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Appends items, creating the collection if absent.
    ///
    /// Every item must match the collection's dimension (or the first item's
    /// dimension for a new collection), otherwise nothing is stored and
    /// [`Error::DimensionMismatch`](crate::Error::DimensionMismatch) is returned.
    async fn add(&self, collection: &str, items: Vec<EmbeddedChunk>) -> Result<()>;

    /// Atomically replaces the whole collection with `items`.
    ///
    /// Concurrent searches observe either the old or the new content.
    async fn replace_all(&self, collection: &str, items: Vec<EmbeddedChunk>) -> Result<()>;

    /// Returns at most `k` chunks ordered by descending similarity, ties in
    /// insertion order.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if the
    /// collection does not exist.
    async fn search(&self, collection: &str, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Discards the collection; later searches fail with `NotFound`.
    async fn clear(&self, collection: &str) -> Result<()>;

    /// Returns the number of items, or `None` if the collection does not exist.
    async fn len(&self, collection: &str) -> Option<usize>;

    /// Returns the names of all existing collections, sorted.
    async fn collections(&self) -> Vec<String>;
}
