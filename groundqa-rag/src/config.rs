//! Configuration for the retrieval and answering pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::DistanceMetric;
use crate::retry::RetryPolicy;

/// Configuration parameters for indexing, retrieval and answering.
///
/// Construct a validated value with [`RagConfig::builder()`]. The defaults
/// match a single small policy document: 500-character chunks with a
/// 50-character overlap and three retrieved chunks per question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// How far back from a window's end the chunker may look for a natural
    /// boundary. `None` uses a quarter of `chunk_size`; `Some(0)` always cuts hard.
    pub boundary_lookback: Option<usize>,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Results scoring below this value are dropped after search.
    pub similarity_threshold: Option<f32>,
    /// Similarity measure used by the index.
    pub metric: DistanceMetric,
    /// Maximum number of embedding batches in flight while building the index.
    pub embed_concurrency: usize,
    /// Number of chunk texts sent per embedding batch.
    pub embed_batch_size: usize,
    /// Timeout applied to each embedding call.
    pub embed_timeout: Duration,
    /// Timeout applied to each generation call.
    pub generate_timeout: Duration,
    /// Retry policy for transient embedding and generation failures.
    pub retry: RetryPolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            boundary_lookback: None,
            top_k: 3,
            similarity_threshold: None,
            metric: DistanceMetric::Cosine,
            embed_concurrency: 4,
            embed_batch_size: 32,
            embed_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The effective boundary look-back distance in characters.
    pub fn effective_lookback(&self) -> usize {
        self.boundary_lookback.unwrap_or(self.chunk_size / 4)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embed_concurrency == 0` or `embed_batch_size == 0`
    /// - either timeout is zero
    /// - `similarity_threshold` is not finite
    pub fn validate(&self) -> Result<()> {
        validate_window(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::invalid("top_k must be greater than zero"));
        }
        if self.embed_concurrency == 0 {
            return Err(RagError::invalid("embed_concurrency must be greater than zero"));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::invalid("embed_batch_size must be greater than zero"));
        }
        if self.embed_timeout.is_zero() || self.generate_timeout.is_zero() {
            return Err(RagError::invalid("timeouts must be greater than zero"));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !threshold.is_finite() {
                return Err(RagError::invalid(format!(
                    "similarity_threshold must be finite, got {threshold}"
                )));
            }
        }
        Ok(())
    }
}

/// Check the chunk window constraints shared by the config and the chunker.
pub(crate) fn validate_window(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::invalid("chunk_size must be greater than zero"));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::invalid(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the boundary look-back distance in characters.
    pub fn boundary_lookback(mut self, lookback: usize) -> Self {
        self.config.boundary_lookback = Some(lookback);
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the similarity measure.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the number of embedding batches in flight during index build.
    pub fn embed_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embed_concurrency = concurrency;
        self
    }

    /// Set the number of texts per embedding batch.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the per-call embedding timeout.
    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout = timeout;
        self
    }

    /// Set the per-call generation timeout.
    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
