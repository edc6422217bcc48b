//! Document chunk type.

use serde::{Deserialize, Serialize};

/// A contiguous window of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The chunk text.
    pub text: String,

    /// Identifier of the source document (its file name by default).
    pub source_id: String,

    /// Position of the chunk within its document (0-based).
    pub sequence: usize,

    /// Start byte offset in the source text.
    pub start_offset: usize,

    /// End byte offset in the source text.
    pub end_offset: usize,
}

impl DocumentChunk {
    /// Returns the number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
