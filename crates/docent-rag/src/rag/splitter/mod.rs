//! Text splitting for chunk creation.

mod chunk;

use std::fmt;

use text_splitter::{Characters, ChunkConfig, TextSplitter};

pub use self::chunk::DocumentChunk;
use crate::{Error, Result};

/// Splits raw text into overlapping, order-preserving chunks.
///
/// Splitting is hierarchical: paragraph boundaries are preferred, then line
/// breaks, sentences, words and finally characters, descending only when a
/// segment does not fit in `chunk_size` characters. Chunks are trimmed, so
/// only whitespace may fall between two consecutive chunks.
pub struct DocumentChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    splitter: TextSplitter<Characters>,
}

impl fmt::Debug for DocumentChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentChunker")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish_non_exhaustive()
    }
}

impl DocumentChunker {
    /// Creates a chunker.
    ///
    /// Fails with [`Error::Config`] unless `chunk_size > 0` and
    /// `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk size must be greater than 0"));
        }

        let chunk_config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| Error::config(format!("invalid chunk overlap: {e}")))?
            .with_trim(true);

        Ok(Self {
            chunk_size,
            chunk_overlap,
            splitter: TextSplitter::new(chunk_config),
        })
    }

    /// Returns the maximum chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the maximum overlap in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into chunks attributed to `source_id`.
    ///
    /// Empty or whitespace-only text yields no chunks. With a non-zero
    /// overlap, consecutive chunks always share between 1 and `chunk_overlap`
    /// characters whenever one of the two has room left under `chunk_size`.
    pub fn chunk(&self, text: &str, source_id: &str) -> Vec<DocumentChunk> {
        let mut spans: Vec<(usize, usize)> = self
            .splitter
            .chunk_indices(text)
            .filter(|(_, chunk)| !chunk.trim().is_empty())
            .map(|(start, chunk)| (start, start + chunk.len()))
            .collect();

        if self.chunk_overlap > 0 {
            for next in 1..spans.len() {
                self.bridge(text, &mut spans, next);
            }
        }

        spans
            .into_iter()
            .enumerate()
            .map(|(sequence, (start_offset, end_offset))| DocumentChunk {
                text: text[start_offset..end_offset].to_owned(),
                source_id: source_id.to_owned(),
                sequence,
                start_offset,
                end_offset,
            })
            .collect()
    }

    /// Makes the chunk at `next` overlap its predecessor when the splitter
    /// cut them apart on a section boundary.
    ///
    /// The later chunk is widened backwards first; if it is already full the
    /// earlier one is widened forwards instead. Neither grows past
    /// `chunk_size` and the shared span never exceeds `chunk_overlap`.
    fn bridge(&self, text: &str, spans: &mut [(usize, usize)], next: usize) {
        let (prev_start, prev_end) = spans[next - 1];
        let (next_start, next_end) = spans[next];
        if next_start < prev_end {
            return;
        }

        let gap = text[prev_end..next_start].chars().count();
        let prev_len = text[prev_start..prev_end].chars().count();
        let next_len = text[next_start..next_end].chars().count();

        // Keep at least one character of the predecessor unshared so starts
        // stay strictly increasing.
        let backward = self
            .chunk_size
            .saturating_sub(next_len + gap)
            .min(self.chunk_overlap)
            .min(prev_len.saturating_sub(1));
        if backward > 0 {
            spans[next].0 = shared_start(&text[prev_start..prev_end], backward) + prev_start;
            return;
        }

        let forward = self
            .chunk_size
            .saturating_sub(prev_len + gap)
            .min(self.chunk_overlap)
            .min(next_len);
        if forward > 0 {
            spans[next - 1].1 = next_start + shared_end(&text[next_start..next_end], forward);
        }
    }
}

/// Byte offset in `chunk` where its last `chars` characters begin, moved
/// forward to a word start when one lies inside that tail.
fn shared_start(chunk: &str, chars: usize) -> usize {
    let start = chunk
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(index, _)| index);

    let tail = &chunk[start..];
    let word_start = tail.char_indices().find(|&(index, c)| {
        index > 0 && !c.is_whitespace() && tail[..index].ends_with(char::is_whitespace)
    });

    match word_start {
        Some((index, _)) => start + index,
        None if tail.starts_with(char::is_whitespace) => {
            start + (tail.len() - tail.trim_start().len())
        }
        None => start,
    }
}

/// Byte length of the first `chars` characters of `chunk`, cut back to the
/// end of a word when a word break lies inside that head.
fn shared_end(chunk: &str, chars: usize) -> usize {
    let end = chunk
        .char_indices()
        .nth(chars)
        .map_or(chunk.len(), |(index, _)| index);

    let head = &chunk[..end];
    if end == chunk.len() {
        return end;
    }

    match head.rfind(char::is_whitespace) {
        Some(index) if !head[..index].trim_end().is_empty() => head[..index].trim_end().len(),
        _ => end,
    }
}
