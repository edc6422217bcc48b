//! Document loading from paths and in-memory bytes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::TRACING_TARGET;
use crate::{Error, Result};

/// Accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detects the format from a file name's extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?;

        if extension.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else if extension.eq_ignore_ascii_case("txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// Extracted text of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier used to attribute chunks, normally the file name.
    pub source_id: String,
    /// Extracted plain text.
    pub text: String,
}

impl Document {
    /// Creates a document from already extracted text.
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}

/// Reads `.txt` and `.pdf` documents.
///
/// The loader only reads caller files; it never creates, moves or deletes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    /// Checks that a name has an accepted extension.
    pub fn format_of(name: &str) -> Result<DocumentFormat> {
        DocumentFormat::from_name(name).ok_or_else(|| Error::unsupported_format(name))
    }

    /// Loads a document from in-memory bytes, using `name` for the format and
    /// as the source id.
    pub async fn load_bytes(name: &str, bytes: Vec<u8>) -> Result<Document> {
        let format = Self::format_of(name)?;

        let text = match format {
            DocumentFormat::Text => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        source_id = name,
                        "Text document is not valid UTF-8, replacing invalid sequences"
                    );
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            },
            DocumentFormat::Pdf => {
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| Error::document(name, format!("PDF extraction aborted: {e}")))?
                    .map_err(|e| Error::document(name, format!("PDF extraction failed: {e}")))?
            }
        };

        tracing::debug!(
            target: TRACING_TARGET,
            source_id = name,
            format = ?format,
            text_len = text.len(),
            "Document loaded"
        );

        Ok(Document::new(name, text))
    }

    /// Loads a document from disk; the source id is the file name.
    pub async fn load_path(path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let name = Self::source_id(path);
        Self::format_of(&name)?;

        let bytes = tokio::fs::read(path).await?;
        Self::load_bytes(&name, bytes).await
    }

    /// Loads several documents. Every extension is checked before any file
    /// is read.
    pub async fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>> {
        for path in paths {
            Self::format_of(&Self::source_id(path.as_ref()))?;
        }

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            documents.push(Self::load_path(path).await?);
        }
        Ok(documents)
    }

    fn source_id(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}
