//! Document chunking.
//!
//! [`SlidingWindowChunker`] walks a document with a window of `chunk_size`
//! characters. Each window end is pulled back to the nearest natural boundary
//! within the look-back distance, trying in order:
//!
//! - a paragraph break (`\n\n`)
//! - a line break
//! - a sentence end (`.`, `!` or `?` followed by whitespace)
//! - any word boundary
//!
//! If none is found the window is cut hard. The next window always starts
//! exactly `chunk_overlap` characters before the previous end, so
//! consecutive chunks share exactly that many characters.

use tracing::debug;

use crate::config::{RagConfig, validate_window};
use crate::document::{Chunk, Document};
use crate::error::Result;

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Split `document` with a boundary-aware sliding window.
///
/// Shorthand for `SlidingWindowChunker::new(chunk_size, overlap)?.chunk(document)`.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfiguration`](crate::RagError::InvalidConfiguration)
/// if `chunk_size == 0` or `overlap >= chunk_size`.
pub fn split(document: &Document, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    SlidingWindowChunker::new(chunk_size, overlap)?.chunk(document)
}

/// Splits text into overlapping windows that prefer natural boundaries.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk
/// inherits the parent document's metadata.
///
/// # Example
///
/// ```rust
/// use groundqa_rag::{Chunker, Document, SlidingWindowChunker};
///
/// let chunker = SlidingWindowChunker::new(500, 50).unwrap();
/// let chunks = chunker.chunk(&Document::new("policy", "Refunds within 30 days.")).unwrap();
/// assert_eq!(chunks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SlidingWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    lookback: usize,
}

impl SlidingWindowChunker {
    /// Create a chunker with the default look-back of `chunk_size / 4`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`](crate::RagError::InvalidConfiguration)
    /// if `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap, lookback: chunk_size / 4 })
    }

    /// Create a chunker from the window settings of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self::new(config.chunk_size, config.chunk_overlap)?
            .with_lookback(config.effective_lookback()))
    }

    /// Set how far back from the window end to search for a boundary.
    /// Zero disables boundary search.
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    /// Pick the end of the window starting at `start` whose hard limit is `hard_end`.
    fn window_end(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        // The next window starts at `end - overlap`, which must be past `start`.
        let min_end = start + self.chunk_overlap + 1;
        let lower = hard_end.saturating_sub(self.lookback).max(min_end);
        if self.lookback == 0 || lower > hard_end {
            return hard_end;
        }

        let tiers: [fn(&[char], usize) -> bool; 4] =
            [is_paragraph_end, is_line_end, is_sentence_end, is_word_end];
        for tier in tiers {
            if let Some(end) = (lower..=hard_end).rev().find(|&end| tier(chars, end)) {
                return end;
            }
        }
        hard_end
    }
}

fn is_paragraph_end(chars: &[char], end: usize) -> bool {
    end >= 2 && chars[end - 2] == '\n' && chars[end - 1] == '\n'
}

fn is_line_end(chars: &[char], end: usize) -> bool {
    end >= 1 && chars[end - 1] == '\n'
}

fn is_sentence_end(chars: &[char], end: usize) -> bool {
    end >= 2 && matches!(chars[end - 2], '.' | '!' | '?') && chars[end - 1].is_whitespace()
}

fn is_word_end(chars: &[char], end: usize) -> bool {
    (end >= 1 && chars[end - 1].is_whitespace())
        || chars.get(end).is_some_and(|c| c.is_whitespace())
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let text = &document.text;
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let chars: Vec<char> = text.chars().collect();
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_offsets.push(text.len());
        let total = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let hard_end = (start + self.chunk_size).min(total);
            let end =
                if hard_end == total { total } else { self.window_end(&chars, start, hard_end) };

            let index = chunks.len();
            chunks.push(Chunk {
                id: format!("{}_{index}", document.id),
                document_id: document.id.clone(),
                index,
                start,
                end,
                text: text[byte_offsets[start]..byte_offsets[end]].to_string(),
                metadata: document.metadata.clone(),
            });

            if end == total {
                break;
            }
            start = end - self.chunk_overlap;
        }

        debug!(document.id = %document.id, chunk_count = chunks.len(), "chunked document");
        Ok(chunks)
    }
}
