//! In-process embedding backends.

#[cfg(feature = "fastembed")]
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingProvider, Result};
use crate::provider::TRACING_TARGET;

/// Dimension of the default local models.
pub const DEFAULT_LOCAL_DIMENSIONS: usize = 384;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feature-hashing embedder over character n-grams and whole words.
///
/// Deterministic and dependency-free: every lowercase n-gram (3 and 4
/// characters) and every word is hashed with FNV-1a into a signed bucket,
/// and the resulting vector is L2-normalised. Texts sharing vocabulary end up
/// close under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    ngram_range: (usize, usize),
}

impl HashingEmbedder {
    /// Creates an embedder producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(EmbeddingError::invalid_input(
                "embedding dimension must be greater than 0",
            ));
        }

        Ok(Self {
            dimensions,
            ngram_range: (3, 4),
        })
    }

    /// Returns the vector dimension.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embeds one text.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.add_feature(&mut vector, word.as_bytes());
        }

        let chars: Vec<char> = lower.chars().collect();
        let mut ngram = String::new();
        for n in self.ngram_range.0..=self.ngram_range.1 {
            for window in chars.windows(n) {
                ngram.clear();
                ngram.extend(window);
                self.add_feature(&mut vector, ngram.as_bytes());
            }
        }

        l2_normalize(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], bytes: &[u8]) {
        let hash = fnv1a(bytes);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

enum Backend {
    Hashing(HashingEmbedder),
    #[cfg(feature = "fastembed")]
    MiniLm(Arc<Mutex<fastembed::TextEmbedding>>),
}

/// In-process embedding provider; never touches the network.
pub struct LocalEmbeddingProvider {
    backend: Backend,
    model_name: String,
    dimensions: usize,
}

impl std::fmt::Debug for LocalEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbeddingProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl LocalEmbeddingProvider {
    /// Creates a feature-hashing provider with the given dimension.
    pub fn hashing(dimensions: usize) -> Result<Self> {
        let embedder = HashingEmbedder::new(dimensions)?;

        Ok(Self {
            model_name: format!("fnv1a-hash-{dimensions}"),
            dimensions,
            backend: Backend::Hashing(embedder),
        })
    }

    /// Loads the `all-MiniLM-L6-v2` sentence-transformer.
    ///
    /// The model files are downloaded on first use and cached by fastembed.
    #[cfg(feature = "fastembed")]
    #[cfg_attr(docsrs, doc(cfg(feature = "fastembed")))]
    pub fn mini_lm() -> Result<Self> {
        let options =
            fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false);

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::model_load_failed(e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            model = "all-MiniLM-L6-v2",
            "Local embedding model loaded"
        );

        Ok(Self {
            model_name: "all-MiniLM-L6-v2".to_owned(),
            dimensions: DEFAULT_LOCAL_DIMENSIONS,
            backend: Backend::MiniLm(Arc::new(Mutex::new(model))),
        })
    }
}

impl Default for LocalEmbeddingProvider {
    fn default() -> Self {
        let embedder = HashingEmbedder {
            dimensions: DEFAULT_LOCAL_DIMENSIONS,
            ngram_range: (3, 4),
        };

        Self {
            model_name: format!("fnv1a-hash-{DEFAULT_LOCAL_DIMENSIONS}"),
            dimensions: DEFAULT_LOCAL_DIMENSIONS,
            backend: Backend::Hashing(embedder),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn provider_name(&self) -> &str {
        "local"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::trace!(
            target: TRACING_TARGET,
            model = %self.model_name,
            batch_size = texts.len(),
            "Embedding locally"
        );

        match &self.backend {
            Backend::Hashing(embedder) => Ok(texts.iter().map(|t| embedder.embed(t)).collect()),
            #[cfg(feature = "fastembed")]
            Backend::MiniLm(model) => {
                let model = Arc::clone(model);
                let texts = texts.to_vec();

                tokio::task::spawn_blocking(move || {
                    let model = model.lock().map_err(|_| {
                        EmbeddingError::new(super::EmbeddingErrorKind::InternalError)
                            .with_message("embedding model lock poisoned")
                    })?;
                    model.embed(texts, None).map_err(|e| {
                        EmbeddingError::new(super::EmbeddingErrorKind::InternalError)
                            .with_message(e.to_string())
                    })
                })
                .await
                .map_err(|e| {
                    EmbeddingError::new(super::EmbeddingErrorKind::InternalError)
                        .with_message(format!("embedding task failed: {e}"))
                })?
            }
        }
    }
}
