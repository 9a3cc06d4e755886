//! Embedding provider trait for generating vector embeddings from text.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::debug;

use crate::error::{FailureKind, RagError, Result};
use crate::retry::{RetryPolicy, with_timeout};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Implementations must be deterministic for a fixed model configuration and
/// report an unreachable backend as
/// [`RagError::EmbeddingUnavailable`](crate::RagError::EmbeddingUnavailable).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The output has the same length and order as `texts`.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Per-call limits applied to embedding requests.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmbedLimits {
    pub batch_size: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

/// Embed one text under a timeout and retry policy.
pub(crate) async fn embed_one(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
    retry: &RetryPolicy,
) -> Result<Vec<f32>> {
    retry
        .run("embed", move || {
            with_timeout(timeout, provider.embed(text), move || {
                RagError::embedding(
                    provider.name(),
                    FailureKind::Timeout,
                    format!("no embedding within {timeout:?}"),
                )
            })
        })
        .await
}

/// Embed every text, sending up to `limits.concurrency` batches at once.
///
/// Batches may complete in any order; results are reassembled in input order.
pub(crate) async fn embed_all(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    limits: EmbedLimits,
) -> Result<Vec<Vec<f32>>> {
    let EmbedLimits { batch_size, concurrency, timeout, retry } = limits;
    debug!(
        provider = provider.name(),
        text_count = texts.len(),
        batch_size,
        concurrency,
        "embedding texts"
    );

    let batches = texts.chunks(batch_size).map(|batch| async move {
        let vectors = retry
            .run("embed_batch", move || {
                with_timeout(timeout, provider.embed_batch(batch), move || {
                    RagError::embedding(
                        provider.name(),
                        FailureKind::Timeout,
                        format!("no embeddings within {timeout:?}"),
                    )
                })
            })
            .await?;
        if vectors.len() != batch.len() {
            let lengths: Vec<usize> = vectors.iter().map(Vec::len).collect();
            return Err(RagError::malformed(
                provider.name(),
                format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                format!("vector lengths: {lengths:?}"),
            ));
        }
        Ok(vectors)
    });

    let per_batch: Vec<Vec<Vec<f32>>> =
        stream::iter(batches).buffered(concurrency).try_collect().await?;
    Ok(per_batch.into_iter().flatten().collect())
}

/// A local feature-hashing embedder.
///
/// Lower-cased alphanumeric tokens are hashed (FNV-1a) into `dimensions`
/// buckets and the counts are L2-normalized. Texts sharing vocabulary point
/// in similar directions, which is enough to rank a small corpus without any
/// external service. Text without tokens maps to the zero vector.
///
/// # Example
///
/// ```rust
/// use groundqa_rag::HashingEmbedder;
///
/// let embedder = HashingEmbedder::new(256).unwrap();
/// let v = embedder.embed_text("refund policy");
/// assert_eq!(v.len(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` values.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `dimensions == 0`.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::invalid("embedding dimensions must be greater than zero"));
        }
        Ok(Self { dimensions })
    }

    /// Embed synchronously; the async trait methods delegate here.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let bucket = fnv1a(&token.to_lowercase()) % self.dimensions as u64;
            vector[bucket as usize] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
