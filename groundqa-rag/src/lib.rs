//! # groundqa-rag
//!
//! Retrieval-augmented question answering: chunk a corpus, embed and index the
//! chunks, retrieve the most relevant ones for a question, and ask an LLM to
//! answer from them.
//!
//! ## Overview
//!
//! - [`SlidingWindowChunker`] splits documents into overlapping, boundary-aware chunks
//! - [`EmbeddingProvider`] maps text to vectors ([`HashingEmbedder`] runs locally)
//! - [`FlatIndex`] answers exact top-k queries by cosine or Euclidean similarity
//! - [`Retriever`] embeds a query and searches the index
//! - [`Generator`] is the seam for LLM backends (see the `groundqa-model` crate)
//! - [`QaOrchestrator`] ties it together behind `answer(query, k)`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use groundqa_rag::mock::MockGenerator;
//! use groundqa_rag::{Document, HashingEmbedder, QaOrchestrator, RagConfig};
//!
//! # async fn run() -> groundqa_rag::Result<()> {
//! let documents = vec![Document::new(
//!     "policy",
//!     "Refunds within 30 days. Digital products non-refundable.",
//! )];
//!
//! let qa = QaOrchestrator::builder()
//!     .config(RagConfig::builder().chunk_size(500).chunk_overlap(50).build()?)
//!     .embedding_provider(Arc::new(HashingEmbedder::new(256)?))
//!     .generator(Arc::new(MockGenerator::new()))
//!     .index(&documents)
//!     .await?;
//!
//! let answer = qa.answer("What is the refund policy?", 3).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors and retries
//!
//! Every fallible operation returns [`RagError`]. Backend failures carry a
//! [`FailureKind`]; only timeouts and network failures are retried, under the
//! [`RetryPolicy`] in [`RagConfig`].

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod mock;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod retry;

pub use chunking::{Chunker, SlidingWindowChunker, split};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, RetrievalResult, ScoredChunk};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{FailureKind, RagError, Result};
pub use generation::Generator;
pub use index::{DistanceMetric, FlatIndex, IndexEntry, VectorIndex, cosine_similarity};
pub use orchestrator::{Answer, QaOrchestrator, QaOrchestratorBuilder};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
pub use retry::{RetryPolicy, with_timeout};
