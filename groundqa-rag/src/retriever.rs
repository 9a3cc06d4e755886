//! Query-time retrieval over a built index.

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Document, RetrievalResult};
use crate::embedding::{EmbedLimits, EmbeddingProvider, embed_all, embed_one};
use crate::error::{RagError, Result};
use crate::index::{FlatIndex, VectorIndex};

/// Answers "which chunks are most relevant to this query?".
///
/// A `Retriever` pairs an [`EmbeddingProvider`] with a [`VectorIndex`] built
/// from the same provider. It is read-only once constructed and can be shared
/// across tasks.
///
/// # Example
///
/// ```rust,ignore
/// use groundqa_rag::{Retriever, RagConfig, SlidingWindowChunker, HashingEmbedder};
///
/// let config = RagConfig::default();
/// let retriever = Retriever::build(
///     Arc::new(HashingEmbedder::new(256)?),
///     &SlidingWindowChunker::from_config(&config)?,
///     &documents,
///     config,
/// )
/// .await?;
/// let hits = retriever.retrieve("What is the refund policy?", 3).await?;
/// ```
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    config: RagConfig,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedding_provider", &self.embedding_provider.name())
            .field("entries", &self.index.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Retriever {
    /// Wrap an already-built index.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfiguration`] if `config` is invalid
    /// - [`RagError::DimensionMismatch`] if the index dimensionality differs
    ///   from the provider's
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: RagConfig,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(expected) = index.dimensions() {
            let actual = embedding_provider.dimensions();
            if expected != actual {
                return Err(RagError::DimensionMismatch { expected, actual });
            }
        }
        Ok(Self { embedding_provider, index, config })
    }

    /// Build phase: chunk every document, embed every chunk and index the result.
    ///
    /// Embedding batches run concurrently (up to `config.embed_concurrency`)
    /// and are zipped back with their chunks in the original order. The
    /// returned retriever is ready for queries.
    ///
    /// # Errors
    ///
    /// Propagates chunking, embedding and index-build errors unchanged.
    pub async fn build(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        chunker: &dyn Chunker,
        documents: &[Document],
        config: RagConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(chunker.chunk(document)?);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let limits = EmbedLimits {
            batch_size: config.embed_batch_size,
            concurrency: config.embed_concurrency,
            timeout: config.embed_timeout,
            retry: config.retry,
        };
        let vectors = embed_all(embedding_provider.as_ref(), &texts, limits).await.map_err(|e| {
            error!(error = %e, "embedding failed during index build");
            e
        })?;

        let index = FlatIndex::build_with_dimensions(
            embedding_provider.dimensions(),
            chunks.into_iter().zip(vectors),
            config.metric,
        )?;

        info!(
            document_count = documents.len(),
            chunk_count = index.len(),
            provider = embedding_provider.name(),
            "built retrieval index"
        );

        Ok(Self { embedding_provider, index: Arc::new(index), config })
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Return up to `k` chunks ranked by relevance to `query`.
    ///
    /// Results below the configured `similarity_threshold`, if any, are
    /// dropped after ranking.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfiguration`] if `k == 0`
    /// - [`RagError::EmbeddingUnavailable`] once retries are exhausted
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(RagError::invalid("k must be greater than zero"));
        }

        let query_embedding = embed_one(
            self.embedding_provider.as_ref(),
            query,
            self.config.embed_timeout,
            &self.config.retry,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let mut results = self.index.search(&query_embedding, k)?;
        if let Some(threshold) = self.config.similarity_threshold {
            results.retain_above(threshold);
        }

        info!(k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}
