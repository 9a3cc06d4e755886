//! Question-answering orchestrator.
//!
//! The [`QaOrchestrator`] composes a [`Retriever`] and a [`Generator`]:
//! retrieve context, render the prompt, generate, return the text verbatim.
//!
//! # Example
//!
//! ```rust,ignore
//! use groundqa_rag::{QaOrchestrator, RagConfig, HashingEmbedder};
//!
//! let qa = QaOrchestrator::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbedder::new(256)?))
//!     .generator(Arc::new(my_generator))
//!     .index(&documents)
//!     .await?;
//!
//! let answer = qa.answer("What is the refund policy?", 3).await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::chunking::{Chunker, SlidingWindowChunker};
use crate::config::RagConfig;
use crate::document::{Document, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{FailureKind, RagError, Result};
use crate::generation::Generator;
use crate::prompt::PromptTemplate;
use crate::retriever::Retriever;
use crate::retry::with_timeout;

/// A generated answer together with the context it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The generator's output, unmodified.
    pub text: String,
    /// The retrieved chunks, best first.
    pub context: RetrievalResult,
}

/// Retrieval-augmented question answering over a built index.
///
/// Construct one via [`QaOrchestrator::builder()`] (which also runs the index
/// build phase) or [`QaOrchestrator::new`] from an existing [`Retriever`].
pub struct QaOrchestrator {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
}

impl QaOrchestrator {
    /// Create a new [`QaOrchestratorBuilder`].
    pub fn builder() -> QaOrchestratorBuilder {
        QaOrchestratorBuilder::default()
    }

    /// Compose an existing retriever with a generator, using the default template.
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>) -> Self {
        Self { retriever, generator, template: PromptTemplate::default() }
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return a reference to the prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Answer `query` using the `k` most relevant chunks.
    ///
    /// The generator is invoked even when nothing was retrieved; the prompt
    /// then says no context was found.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfiguration`] if `k == 0`
    /// - [`RagError::EmbeddingUnavailable`] or [`RagError::GenerationUnavailable`]
    ///   once retries are exhausted, or immediately for fatal kinds
    /// - [`RagError::MalformedResponse`] if the generator's body was unreadable
    pub async fn answer(&self, query: &str, k: usize) -> Result<String> {
        Ok(self.ask(query, k).await?.text)
    }

    /// Answer `query` with the configured `top_k`.
    pub async fn answer_default(&self, query: &str) -> Result<String> {
        self.answer(query, self.retriever.config().top_k).await
    }

    /// Like [`answer`](QaOrchestrator::answer), also returning the retrieved context.
    pub async fn ask(&self, query: &str, k: usize) -> Result<Answer> {
        let context = self.retriever.retrieve(query, k).await?;
        let prompt = self.template.render(&context, query);
        let text = self.generate(&prompt).await?;

        info!(
            generator = self.generator.name(),
            context_count = context.len(),
            answer_len = text.len(),
            "answered query"
        );
        Ok(Answer { text, context })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let config = self.retriever.config();
        let timeout = config.generate_timeout;
        let generator = self.generator.as_ref();

        config
            .retry
            .run("generate", move || {
                with_timeout(timeout, generator.generate(prompt), move || {
                    RagError::generation(
                        generator.name(),
                        FailureKind::Timeout,
                        format!("no response within {timeout:?}"),
                    )
                })
            })
            .await
            .map_err(|e| {
                error!(generator = generator.name(), error = %e, "generation failed");
                e
            })
    }
}

/// Builder for constructing a [`QaOrchestrator`] from raw documents.
///
/// `embedding_provider` and `generator` are required. The chunker defaults
/// to a [`SlidingWindowChunker`] using the config's window settings, and the
/// config defaults to [`RagConfig::default()`].
#[derive(Default)]
pub struct QaOrchestratorBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn Generator>>,
    chunker: Option<Arc<dyn Chunker>>,
    template: Option<PromptTemplate>,
}

impl QaOrchestratorBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generator.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the prompt template.
    pub fn prompt_template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Run the build phase over `documents` and return a ready orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a required field is
    /// missing, and propagates build-phase errors unchanged.
    pub async fn index(self, documents: &[Document]) -> Result<QaOrchestrator> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::invalid("embedding_provider is required"))?;
        let generator = self.generator.ok_or_else(|| RagError::invalid("generator is required"))?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(SlidingWindowChunker::from_config(&config)?),
        };

        let retriever =
            Retriever::build(embedding_provider, chunker.as_ref(), documents, config).await?;

        Ok(QaOrchestrator { retriever, generator, template: self.template.unwrap_or_default() })
    }
}
