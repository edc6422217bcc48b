//! In-memory vector index.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EmbeddedChunk, ScoredChunk, VectorIndex, cosine_similarity};
use crate::rag::TRACING_TARGET;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Collection {
    dimension: Option<usize>,
    items: Vec<EmbeddedChunk>,
}

impl Collection {
    fn build(items: Vec<EmbeddedChunk>) -> Result<Self> {
        let dimension = items.first().map(|item| item.vector.len());
        if let Some(expected) = dimension {
            check_dimension(expected, &items)?;
        }
        Ok(Self { dimension, items })
    }
}

fn check_dimension(expected: usize, items: &[EmbeddedChunk]) -> Result<()> {
    match items.iter().find(|item| item.vector.len() != expected) {
        Some(item) => Err(Error::dimension_mismatch(expected, item.vector.len())),
        None => Ok(()),
    }
}

/// Vector index held in process memory.
///
/// Each collection is an immutable snapshot behind an `Arc`. Writers build
/// the next snapshot and swap it in under the write lock; searches clone the
/// `Arc` under the read lock and score outside of it.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl MemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    async fn snapshot(&self, collection: &str) -> Option<Arc<Collection>> {
        self.collections.read().await.get(collection).cloned()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn add(&self, collection: &str, items: Vec<EmbeddedChunk>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        let count = items.len();

        let existing = match collections.entry(collection.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Collection::build(items)?));
                tracing::debug!(target: TRACING_TARGET, collection, count, "Created collection");
                return Ok(());
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        let expected = existing
            .dimension
            .unwrap_or_else(|| items[0].vector.len());
        check_dimension(expected, &items)?;

        let next = Arc::make_mut(existing);
        next.dimension = Some(expected);
        next.items.extend(items);

        tracing::debug!(
            target: TRACING_TARGET,
            collection,
            count,
            total = next.items.len(),
            "Appended to collection"
        );

        Ok(())
    }

    async fn replace_all(&self, collection: &str, items: Vec<EmbeddedChunk>) -> Result<()> {
        let count = items.len();
        let next = Arc::new(Collection::build(items)?);

        self.collections
            .write()
            .await
            .insert(collection.to_owned(), next);

        tracing::debug!(target: TRACING_TARGET, collection, count, "Replaced collection");
        Ok(())
    }

    async fn search(&self, collection: &str, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let snapshot = self
            .snapshot(collection)
            .await
            .ok_or_else(|| Error::not_found(collection))?;

        if let Some(expected) = snapshot.dimension
            && expected != query.len()
        {
            return Err(Error::dimension_mismatch(expected, query.len()));
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = snapshot
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (position, cosine_similarity(query, &item.vector)))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                chunk: snapshot.items[position].chunk.clone(),
                score,
            })
            .collect())
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let removed = self.collections.write().await.remove(collection);

        tracing::debug!(
            target: TRACING_TARGET,
            collection,
            existed = removed.is_some(),
            "Cleared collection"
        );

        Ok(())
    }

    async fn len(&self, collection: &str) -> Option<usize> {
        self.snapshot(collection).await.map(|c| c.items.len())
    }

    async fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::DocumentChunk;

    fn item(text: &str, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk::new(
            DocumentChunk {
                text: text.to_owned(),
                source_id: "doc".to_owned(),
                sequence: 0,
                start_offset: 0,
                end_offset: text.len(),
            },
            vector,
        )
    }

    fn texts(results: &[ScoredChunk]) -> Vec<&str> {
        results.iter().map(|r| r.chunk.text.as_str()).collect()
    }

    #[tokio::test]
    async fn never_populated_collection_is_not_found() {
        let index = MemoryIndex::new();
        let error = index.search("document_chunks", &[1.0], 3).await.unwrap_err();
        assert!(error.is_not_found());
        assert_eq!(index.len("document_chunks").await, None);
    }

    #[tokio::test]
    async fn cleared_collection_is_not_found() {
        let index = MemoryIndex::new();
        index
            .replace_all("c", vec![item("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        index.clear("c").await.unwrap();

        assert!(index.search("c", &[1.0, 0.0], 3).await.unwrap_err().is_not_found());
        assert!(index.collections().await.is_empty());
    }

    #[tokio::test]
    async fn results_ranked_by_similarity() {
        let index = MemoryIndex::new();
        index
            .add(
                "c",
                vec![
                    item("far", vec![0.0, 1.0]),
                    item("near", vec![1.0, 0.1]),
                    item("exact", vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let results = index.search("c", &[1.0, 0.0], 2).await.unwrap();

        assert_eq!(texts(&results), vec!["exact", "near"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let index = MemoryIndex::new();
        index
            .add("c", vec![item("first", vec![1.0, 0.0]), item("second", vec![2.0, 0.0])])
            .await
            .unwrap();
        index.add("c", vec![item("third", vec![3.0, 0.0])]).await.unwrap();

        let results = index.search("c", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(texts(&results), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn zero_k_returns_empty() {
        let index = MemoryIndex::new();
        index.add("c", vec![item("a", vec![1.0])]).await.unwrap();
        assert!(index.search("c", &[1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_dimensions_fail_fast() {
        let index = MemoryIndex::new();
        index.add("c", vec![item("a", vec![1.0, 0.0])]).await.unwrap();

        let add = index.add("c", vec![item("b", vec![1.0, 0.0, 0.0])]).await;
        assert!(matches!(add, Err(Error::DimensionMismatch { expected: 2, actual: 3 })));

        let search = index.search("c", &[1.0], 1).await;
        assert!(matches!(search, Err(Error::DimensionMismatch { expected: 2, actual: 1 })));

        let mixed = index
            .replace_all("c", vec![item("x", vec![1.0]), item("y", vec![1.0, 2.0])])
            .await;
        assert!(matches!(mixed, Err(Error::DimensionMismatch { .. })));

        assert_eq!(index.len("c").await, Some(1));
    }

    #[tokio::test]
    async fn replace_all_swaps_content() {
        let index = MemoryIndex::new();
        index.add("c", vec![item("old", vec![1.0, 0.0])]).await.unwrap();
        index
            .replace_all("c", vec![item("new", vec![1.0, 0.0]), item("newer", vec![0.0, 1.0])])
            .await
            .unwrap();

        let results = index.search("c", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(texts(&results), vec!["new", "newer"]);
    }

    #[tokio::test]
    async fn snapshot_survives_concurrent_replace() {
        let index = MemoryIndex::new();
        index.add("c", vec![item("old", vec![1.0])]).await.unwrap();

        let snapshot = index.snapshot("c").await.unwrap();
        index.replace_all("c", vec![item("new", vec![1.0])]).await.unwrap();
        index.add("c", vec![item("newer", vec![1.0])]).await.unwrap();

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].chunk.text, "old");
        assert_eq!(index.len("c").await, Some(2));
    }

    #[tokio::test]
    async fn empty_add_does_not_create_collection() {
        let index = MemoryIndex::new();
        index.add("c", Vec::new()).await.unwrap();
        assert_eq!(index.len("c").await, None);
    }
}
