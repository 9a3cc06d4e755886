//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the source URI.
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }
}

/// A bounded segment of a [`Document`].
///
/// Offsets count characters, not bytes, and describe the half-open range
/// `[start, end)` of the parent document's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Identifier of the form `{document_id}_{index}`.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of this chunk within its document, starting at 0.
    pub index: usize,
    /// Character offset where the chunk starts.
    pub start: usize,
    /// Character offset one past the chunk's last character.
    pub end: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Number of characters covered by the chunk.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Ranked retrieval output, ordered by descending score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RetrievalResult {
    hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Wrap hits that are already ranked.
    pub(crate) fn from_ranked(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    /// An empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate over hits in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.hits.iter()
    }

    /// The best hit, if any.
    pub fn top(&self) -> Option<&ScoredChunk> {
        self.hits.first()
    }

    /// The hits as a slice.
    pub fn as_slice(&self) -> &[ScoredChunk] {
        &self.hits
    }

    /// Consume the result, returning the hits.
    pub fn into_vec(self) -> Vec<ScoredChunk> {
        self.hits
    }

    /// Distinct source document ids in rank order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for hit in &self.hits {
            let id = hit.chunk.document_id.as_str();
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// Keep only hits scoring at least `threshold`. Order is unchanged.
    pub(crate) fn retain_above(&mut self, threshold: f32) {
        self.hits.retain(|hit| hit.score >= threshold);
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}
