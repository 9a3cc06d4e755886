//! Vector index trait and exact (flat) implementation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Chunk, RetrievalResult, ScoredChunk};
use crate::error::{RagError, Result};

/// How similarity between two vectors is measured.
///
/// Every metric yields a score where higher means more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `dot(a, b) / (|a| * |b|)`, in `[-1, 1]`.
    #[default]
    Cosine,
    /// `1 / (1 + |a - b|)`, in `(0, 1]`.
    Euclidean,
}

impl DistanceMetric {
    /// Score `a` against `b`. Both slices must have the same length.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Compute the Euclidean distance between two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// A stored chunk with its embedding and index-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Insertion position, starting at 0.
    pub id: usize,
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The chunk's embedding.
    pub vector: Vec<f32>,
}

/// A read-only nearest-neighbor index over chunk embeddings.
///
/// Implementations are built once and then only queried. An approximate
/// implementation may replace [`FlatIndex`] behind this trait as long as it
/// documents its recall trade-off.
pub trait VectorIndex: Send + Sync {
    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of stored vectors, if known.
    fn dimensions(&self) -> Option<usize>;

    /// The similarity measure used by [`search`](VectorIndex::search).
    fn metric(&self) -> DistanceMetric;

    /// Return the `k` entries most similar to `query`, best first.
    ///
    /// Ties are broken by insertion order. `k` larger than the entry count is
    /// clamped; an empty index yields an empty result.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfiguration`] if `k == 0` or `query` holds a non-finite value
    /// - [`RagError::DimensionMismatch`] if `query` has the wrong length
    fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult>;
}

/// Exact index that scores every entry on each query.
///
/// Search is a linear scan, O(n · d) per query, with perfect recall.
///
/// # Example
///
/// ```rust
/// use groundqa_rag::{DistanceMetric, FlatIndex, VectorIndex};
///
/// let index = FlatIndex::build(Vec::new(), DistanceMetric::Cosine).unwrap();
/// assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    dimensions: Option<usize>,
    metric: DistanceMetric,
}

impl FlatIndex {
    /// Build an index whose dimensionality is taken from the first vector.
    ///
    /// # Errors
    ///
    /// - [`RagError::DimensionMismatch`] if any vector's length differs from the first
    /// - [`RagError::InvalidConfiguration`] if a vector is empty or holds a non-finite value
    pub fn build(
        entries: impl IntoIterator<Item = (Chunk, Vec<f32>)>,
        metric: DistanceMetric,
    ) -> Result<Self> {
        Self::build_inner(None, entries, metric)
    }

    /// Build an index whose vectors must all have `dimensions` values.
    ///
    /// # Errors
    ///
    /// As [`FlatIndex::build`], and [`RagError::InvalidConfiguration`] if
    /// `dimensions == 0`.
    pub fn build_with_dimensions(
        dimensions: usize,
        entries: impl IntoIterator<Item = (Chunk, Vec<f32>)>,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::invalid("index dimensions must be greater than zero"));
        }
        Self::build_inner(Some(dimensions), entries, metric)
    }

    fn build_inner(
        mut dimensions: Option<usize>,
        entries: impl IntoIterator<Item = (Chunk, Vec<f32>)>,
        metric: DistanceMetric,
    ) -> Result<Self> {
        let mut stored = Vec::new();
        for (id, (chunk, vector)) in entries.into_iter().enumerate() {
            if vector.is_empty() {
                return Err(RagError::invalid(format!(
                    "chunk '{}' has an empty embedding",
                    chunk.id
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(RagError::invalid(format!(
                    "chunk '{}' has a non-finite embedding value",
                    chunk.id
                )));
            }
            let expected = *dimensions.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: vector.len() });
            }
            stored.push(IndexEntry { id, chunk, vector });
        }

        debug!(entry_count = stored.len(), ?dimensions, ?metric, "built flat index");
        Ok(Self { entries: stored, dimensions, metric })
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn get(&self, id: usize) -> Option<&IndexEntry> {
        self.entries.get(id)
    }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(RagError::invalid("k must be greater than zero"));
        }
        if self.entries.is_empty() {
            return Ok(RetrievalResult::empty());
        }
        if let Some(expected) = self.dimensions {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: query.len() });
            }
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(RagError::invalid("query vector has a non-finite value"));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry.id, self.metric.score(&entry.vector, query)))
            .collect();

        // Descending score, then ascending insertion id.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        let hits = scored
            .into_iter()
            .map(|(id, score)| ScoredChunk { chunk: self.entries[id].chunk.clone(), score })
            .collect();
        Ok(RetrievalResult::from_ranked(hits))
    }
}
