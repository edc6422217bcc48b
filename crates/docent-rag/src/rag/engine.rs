//! Retrieval engine: ingestion and semantic lookup.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{
    Document, DocumentChunker, DocumentLoader, EmbeddedChunk, MemoryIndex, RagConfig,
    TRACING_TARGET, VectorIndex,
};
use crate::provider::EmbeddingService;
use crate::{Error, Result};

/// Maximum number of chunks sent to the embedding provider in one request.
const EMBED_BATCH_SIZE: usize = 64;

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_id: String,
    pub sequence: usize,
    pub score: f32,
}

/// Outcome of an ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Documents that produced at least one chunk.
    pub documents: usize,
    /// Chunks written to the index.
    pub chunks: usize,
}

/// Combines the chunker, the embedding service and a vector index.
///
/// The engine is cheap to clone and can be shared across tasks.
#[derive(Clone)]
pub struct RetrievalEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    chunker: DocumentChunker,
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    config: RagConfig,
}

impl fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("chunker", &self.inner.chunker)
            .field("embeddings", &self.inner.embeddings)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl RetrievalEngine {
    /// Creates an engine backed by an in-memory index.
    pub fn new(embeddings: EmbeddingService, config: RagConfig) -> Result<Self> {
        Self::with_index(embeddings, Arc::new(MemoryIndex::new()), config)
    }

    /// Creates an engine backed by the given index.
    pub fn with_index(
        embeddings: EmbeddingService,
        index: Arc<dyn VectorIndex>,
        config: RagConfig,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = DocumentChunker::new(config.chunk_size, config.chunk_overlap)?;

        tracing::debug!(
            target: TRACING_TARGET,
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            collection = %config.collection,
            embedding_model = embeddings.model_name(),
            "Creating retrieval engine"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                chunker,
                embeddings,
                index,
                config,
            }),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Returns the embedding service.
    pub fn embeddings(&self) -> &EmbeddingService {
        &self.inner.embeddings
    }

    /// Replaces the collection with the chunks of `documents`.
    ///
    /// All documents are chunked and embedded before the index is touched, so
    /// an embedding failure leaves the previous content in place.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestSummary> {
        let (items, summary) = self.embed_documents(documents).await?;
        self.inner
            .index
            .replace_all(&self.inner.config.collection, items)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            documents = summary.documents,
            chunks = summary.chunks,
            "Documents ingested"
        );

        Ok(summary)
    }

    /// Adds the chunks of `documents` to the existing collection.
    pub async fn append(&self, documents: &[Document]) -> Result<IngestSummary> {
        let (items, summary) = self.embed_documents(documents).await?;
        self.inner
            .index
            .add(&self.inner.config.collection, items)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            documents = summary.documents,
            chunks = summary.chunks,
            "Documents appended"
        );

        Ok(summary)
    }

    /// Loads `.txt` / `.pdf` files and ingests them.
    ///
    /// Unsupported extensions are rejected before any file is read or embedded.
    pub async fn ingest_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<IngestSummary> {
        let documents = DocumentLoader::load_paths(paths).await?;
        self.ingest(&documents).await
    }

    /// Loads `.txt` / `.pdf` files and appends them to the collection.
    pub async fn append_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<IngestSummary> {
        let documents = DocumentLoader::load_paths(paths).await?;
        self.append(&documents).await
    }

    /// Returns up to `k` chunks most similar to `query`, with scores.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let started_at = Instant::now();
        let vector = self.inner.embeddings.embed_one(query).await?;

        let results = self
            .inner
            .index
            .search(&self.inner.config.collection, &vector, k)
            .await?;

        let min_score = self.inner.config.min_score;
        let retrieved: Vec<RetrievedChunk> = results
            .into_iter()
            .filter(|r| min_score.is_none_or(|min| r.score >= min))
            .map(|r| RetrievedChunk {
                text: r.chunk.text,
                source_id: r.chunk.source_id,
                sequence: r.chunk.sequence,
                score: r.score,
            })
            .collect();

        tracing::debug!(
            target: TRACING_TARGET,
            k,
            results = retrieved.len(),
            top_score = retrieved.first().map(|r| r.score),
            elapsed_ms = started_at.elapsed().as_millis(),
            "Search completed"
        );

        Ok(retrieved)
    }

    /// Returns the texts of up to `k` chunks most similar to `query`, best first.
    ///
    /// Fails with [`Error::NotFound`] when no documents have been ingested.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let results = self.search(query, k).await?;
        Ok(results.into_iter().map(|r| r.text).collect())
    }

    /// Discards every ingested chunk.
    pub async fn clear(&self) -> Result<()> {
        self.inner.index.clear(&self.inner.config.collection).await
    }

    /// Returns the number of indexed chunks.
    pub async fn chunk_count(&self) -> usize {
        self.inner
            .index
            .len(&self.inner.config.collection)
            .await
            .unwrap_or(0)
    }

    /// Returns true if nothing is indexed.
    pub async fn is_empty(&self) -> bool {
        self.chunk_count().await == 0
    }

    async fn embed_documents(
        &self,
        documents: &[Document],
    ) -> Result<(Vec<EmbeddedChunk>, IngestSummary)> {
        let mut items = Vec::new();
        let mut summary = IngestSummary {
            documents: 0,
            chunks: 0,
        };

        for document in documents {
            let chunks = self
                .inner
                .chunker
                .chunk(&document.text, &document.source_id);

            if chunks.is_empty() {
                tracing::warn!(
                    target: TRACING_TARGET,
                    source_id = %document.source_id,
                    "Document has no extractable text"
                );
                continue;
            }

            summary.documents += 1;
            summary.chunks += chunks.len();

            for batch in chunks.chunks(EMBED_BATCH_SIZE) {
                let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
                let vectors = self.inner.embeddings.embed_batch(&texts).await?;

                items.extend(
                    batch
                        .iter()
                        .cloned()
                        .zip(vectors)
                        .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector)),
                );
            }
        }

        if items.is_empty() {
            return Err(Error::validation(
                "no extractable text in the provided documents",
            ));
        }

        Ok((items, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingProvider;
    use crate::provider::{EmbeddingErrorKind, LocalEmbeddingProvider, RetryPolicy};

    const PHOTOSYNTHESIS: &str = "Photosynthesis converts sunlight, water and carbon dioxide into glucose inside chloroplasts.";
    const VOLCANOES: &str = "Volcanoes erupt when magma pressure beneath the crust forces molten rock to the surface.";

    fn engine() -> RetrievalEngine {
        let embeddings = EmbeddingService::new(LocalEmbeddingProvider::default());
        RetrievalEngine::new(embeddings, RagConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn retrieve_before_ingest_is_not_found() {
        let error = engine().retrieve("anything", 3).await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn exact_chunk_ranks_first() {
        let engine = engine();
        let summary = engine
            .ingest(&[
                Document::new("biology.txt", PHOTOSYNTHESIS),
                Document::new("geology.txt", VOLCANOES),
            ])
            .await
            .unwrap();

        assert_eq!(summary, IngestSummary { documents: 2, chunks: 2 });

        let results = engine.search(VOLCANOES, 3).await.unwrap();
        assert_eq!(results[0].text, VOLCANOES);
        assert_eq!(results[0].source_id, "geology.txt");
        assert!((results[0].score - 1.0).abs() < 1e-4);

        let texts = engine.retrieve(PHOTOSYNTHESIS, 1).await.unwrap();
        assert_eq!(texts, vec![PHOTOSYNTHESIS.to_owned()]);
    }

    #[tokio::test]
    async fn ingest_replaces_previous_documents() {
        let engine = engine();
        engine
            .ingest(&[Document::new("biology.txt", PHOTOSYNTHESIS)])
            .await
            .unwrap();
        engine
            .ingest(&[Document::new("geology.txt", VOLCANOES)])
            .await
            .unwrap();

        let texts = engine.retrieve(PHOTOSYNTHESIS, 5).await.unwrap();
        assert_eq!(texts, vec![VOLCANOES.to_owned()]);
    }

    #[tokio::test]
    async fn append_merges_documents() {
        let engine = engine();
        engine
            .ingest(&[Document::new("biology.txt", PHOTOSYNTHESIS)])
            .await
            .unwrap();
        engine
            .append(&[Document::new("geology.txt", VOLCANOES)])
            .await
            .unwrap();

        assert_eq!(engine.chunk_count().await, 2);
    }

    #[tokio::test]
    async fn blank_documents_are_rejected() {
        let engine = engine();
        let error = engine
            .ingest(&[Document::new("empty.txt", "  \n\n ")])
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Validation(_)));
        assert!(engine.retrieve("query", 3).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn embedding_failure_leaves_index_untouched() {
        let provider = MockEmbeddingProvider::new(32).unwrap();
        let embeddings = EmbeddingService::with_retry(provider.clone(), RetryPolicy::none());
        let engine = RetrievalEngine::new(embeddings, RagConfig::default()).unwrap();

        engine
            .ingest(&[Document::new("biology.txt", PHOTOSYNTHESIS)])
            .await
            .unwrap();

        provider.fail_with(Some(EmbeddingErrorKind::Authentication));
        let error = engine
            .ingest(&[Document::new("geology.txt", VOLCANOES)])
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Embedding(_)));

        provider.fail_with(None);
        let texts = engine.retrieve(VOLCANOES, 5).await.unwrap();
        assert_eq!(texts, vec![PHOTOSYNTHESIS.to_owned()]);
    }

    #[tokio::test]
    async fn min_score_filters_weak_matches() {
        let embeddings = EmbeddingService::new(LocalEmbeddingProvider::default());
        let config = RagConfig {
            min_score: Some(0.99),
            ..Default::default()
        };
        let engine = RetrievalEngine::new(embeddings, config).unwrap();
        engine
            .ingest(&[
                Document::new("biology.txt", PHOTOSYNTHESIS),
                Document::new("geology.txt", VOLCANOES),
            ])
            .await
            .unwrap();

        let texts = engine.retrieve(PHOTOSYNTHESIS, 3).await.unwrap();
        assert_eq!(texts, vec![PHOTOSYNTHESIS.to_owned()]);
    }

    #[tokio::test]
    async fn clear_forgets_documents() {
        let engine = engine();
        engine
            .ingest(&[Document::new("biology.txt", PHOTOSYNTHESIS)])
            .await
            .unwrap();
        engine.clear().await.unwrap();

        assert!(engine.is_empty().await);
        assert!(engine.retrieve("glucose", 3).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn ingest_paths_rejects_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, PHOTOSYNTHESIS).unwrap();
        let slides = dir.path().join("slides.pptx");
        std::fs::write(&slides, "binary").unwrap();

        let engine = engine();
        let error = engine.ingest_paths(&[notes.clone(), slides]).await.unwrap_err();
        assert!(matches!(error, Error::UnsupportedFormat { .. }));
        assert!(engine.is_empty().await);

        let summary = engine.ingest_paths(&[notes]).await.unwrap();
        assert_eq!(summary.chunks, 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let embeddings = EmbeddingService::new(LocalEmbeddingProvider::default());
        let config = RagConfig {
            chunk_overlap: 2000,
            ..Default::default()
        };
        assert!(matches!(
            RetrievalEngine::new(embeddings, config),
            Err(Error::Config(_))
        ));
    }
}
