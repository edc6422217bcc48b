//! Error types for docent-rag.

use std::fmt;

use crate::provider::{CompletionError, EmbeddingError};

/// Result type alias for docent-rag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the retrieval and conversation core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid chunking, index or provider configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A value failed validation (profile fields, empty corpus, etc.).
    #[error("validation error: {0}")]
    Validation(String),

    /// The document is neither a `.pdf` nor a `.txt` file.
    #[error("unsupported format: {path}: only .pdf and .txt documents are accepted")]
    UnsupportedFormat { path: String },

    /// Text could not be extracted from a document.
    #[error("document error: {source_id}: {message}")]
    Document { source_id: String, message: String },

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vectors from different embedding spaces were mixed.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The collection has never been populated or was cleared.
    #[error("collection not found: {0}")]
    NotFound(String),

    /// Language model failure.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Creates a validation error.
    pub fn validation(message: impl fmt::Display) -> Self {
        Self::Validation(message.to_string())
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(path: impl fmt::Display) -> Self {
        Self::UnsupportedFormat {
            path: path.to_string(),
        }
    }

    /// Creates a document extraction error.
    pub fn document(source_id: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Document {
            source_id: source_id.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a not found error for the named collection.
    pub fn not_found(collection: impl fmt::Display) -> Self {
        Self::NotFound(collection.to_string())
    }

    /// Returns true if this error means no documents have been processed yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Embedding(e) => e.is_retryable(),
            Self::Completion(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EmbeddingErrorKind;

    #[test]
    fn not_found_is_distinguishable() {
        assert!(Error::not_found("document_chunks").is_not_found());
        assert!(!Error::validation("empty").is_not_found());
    }

    #[test]
    fn retryable_follows_inner_error() {
        let transient = Error::from(EmbeddingError::new(EmbeddingErrorKind::Timeout));
        let permanent = Error::from(EmbeddingError::new(EmbeddingErrorKind::Authentication));

        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
        assert!(!Error::dimension_mismatch(3, 4).is_retryable());
    }

    #[test]
    fn unsupported_format_names_path() {
        let error = Error::unsupported_format("notes.docx");
        assert!(error.to_string().contains("notes.docx"));
    }
}
