//! # groundqa-cli
//!
//! Command-line front end for GroundQA: load a document (or the built-in
//! sample policy), index it, answer one question and print the answer.
//!
//! Credentials and backend settings come from flags or the environment; a
//! `.env` file in the working directory is loaded first.
//!
//! ```bash
//! # Groq chat completions (GROQ_API_KEY)
//! groundqa "What is the refund policy?"
//!
//! # Bedrock invoke endpoint (AWS_BEARER_TOKEN_BEDROCK, AWS_DEFAULT_REGION, BEDROCK_MODEL_ID)
//! groundqa --backend bedrock --corpus policy.txt "How long do refunds take?"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use groundqa_model::chat::{DEFAULT_GROQ_MODEL, GROQ_API_BASE};
use groundqa_model::embedding::{DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE};
use groundqa_model::invoke::{DEFAULT_MODEL_ID, DEFAULT_REGION};
use groundqa_model::{
    ChatCompletionGenerator, ChatConfig, InvokeConfig, InvokeModelGenerator, OpenAiEmbedder,
};
use groundqa_rag::{
    Answer, Document, EmbeddingProvider, Generator, HashingEmbedder, QaOrchestrator, RagConfig,
};
use tracing::info;

/// The document answered from when no `--corpus` is given.
pub const SAMPLE_POLICY: &str = "
Company Policy Document

Refund Policy:
Customers may request a refund within 30 days of purchase if they are not satisfied with the product.
Refunds will be processed within 7 business days after approval.
Digital products are non-refundable once downloaded.
";

/// Which generator answers the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// OpenAI-compatible chat completions on Groq.
    Groq,
    /// Raw-completion invoke endpoint on Bedrock.
    Bedrock,
}

/// Which embedder indexes the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Local feature hashing; needs no service.
    Hash,
    /// OpenAI-compatible `/embeddings`.
    Openai,
}

/// Answer a question from a document with retrieval-augmented generation.
#[derive(Parser, Debug)]
#[command(name = "groundqa", version, about)]
pub struct Cli {
    /// The question to answer.
    #[arg(default_value = "What is the refund policy?")]
    pub question: String,

    /// Text file to answer from. Defaults to a built-in sample policy.
    #[arg(short, long)]
    pub corpus: Option<PathBuf>,

    /// Generator backend.
    #[arg(short, long, value_enum, env = "GROUNDQA_BACKEND", default_value = "groq")]
    pub backend: Backend,

    /// Embedding backend.
    #[arg(short, long, value_enum, env = "GROUNDQA_EMBEDDER", default_value = "hash")]
    pub embedder: EmbedderKind,

    /// Number of chunks retrieved per question.
    #[arg(short = 'k', long, default_value_t = 3)]
    pub top_k: usize,

    /// Maximum chunk size in characters.
    #[arg(long, default_value_t = 500)]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value_t = 50)]
    pub chunk_overlap: usize,

    /// Print the ids of the documents the answer was grounded on.
    #[arg(long)]
    pub show_sources: bool,

    /// Groq API key.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Groq chat model.
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_GROQ_MODEL)]
    pub groq_model: String,

    /// Chat completions API base URL.
    #[arg(long, env = "GROQ_BASE_URL", default_value = GROQ_API_BASE)]
    pub groq_base_url: String,

    /// Bedrock API key (bearer token).
    #[arg(long, env = "AWS_BEARER_TOKEN_BEDROCK", hide_env_values = true)]
    pub bedrock_api_key: Option<String>,

    /// Bedrock region.
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Bedrock model identifier.
    #[arg(long, env = "BEDROCK_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Override the Bedrock runtime endpoint.
    #[arg(long, env = "BEDROCK_ENDPOINT")]
    pub bedrock_endpoint: Option<String>,

    /// Maximum number of generated tokens (Bedrock).
    #[arg(long, default_value_t = 512)]
    pub max_gen_len: u32,

    /// Sampling temperature (Bedrock), within [0, 1].
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Nucleus sampling mass (Bedrock), within [0, 1].
    #[arg(long, default_value_t = 0.9)]
    pub top_p: f32,

    /// Dimensions of the local hashing embedder.
    #[arg(long, default_value_t = 384)]
    pub hash_dimensions: usize,

    /// OpenAI API key for the `openai` embedder.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI embedding model. Models other than the default also need
    /// `--openai-dimensions`.
    #[arg(long, env = "OPENAI_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub openai_model: String,

    /// Embeddings API base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_API_BASE)]
    pub openai_base_url: String,

    /// Requested embedding dimensions (Matryoshka truncation). Required when
    /// `--openai-model` is not the default.
    #[arg(long)]
    pub openai_dimensions: Option<usize>,
}

impl Cli {
    /// Pipeline configuration from the window and retrieval flags.
    pub fn rag_config(&self) -> Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .build()
            .context("invalid retrieval settings")
    }

    /// Build the selected generator.
    pub fn generator(&self) -> Result<Arc<dyn Generator>> {
        match self.backend {
            Backend::Groq => {
                let api_key = required(&self.groq_api_key, "GROQ_API_KEY", "--groq-api-key")?;
                let config = ChatConfig::new(api_key, &self.groq_model, &self.groq_base_url);
                Ok(Arc::new(ChatCompletionGenerator::new(config)?))
            }
            Backend::Bedrock => {
                let api_key = required(
                    &self.bedrock_api_key,
                    "AWS_BEARER_TOKEN_BEDROCK",
                    "--bedrock-api-key",
                )?;
                let mut config = InvokeConfig::new(api_key)
                    .with_region(&self.region)
                    .with_model_id(&self.model_id)
                    .with_max_gen_len(self.max_gen_len)
                    .with_temperature(self.temperature)
                    .with_top_p(self.top_p);
                if let Some(endpoint) = &self.bedrock_endpoint {
                    config = config.with_endpoint(endpoint);
                }
                Ok(Arc::new(InvokeModelGenerator::new(config)?))
            }
        }
    }

    /// Build the selected embedder.
    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self.embedder {
            EmbedderKind::Hash => Ok(Arc::new(HashingEmbedder::new(self.hash_dimensions)?)),
            EmbedderKind::Openai => {
                let api_key =
                    required(&self.openai_api_key, "OPENAI_API_KEY", "--openai-api-key")?;
                let embedder = OpenAiEmbedder::new(api_key)?
                    .with_model(&self.openai_model)
                    .with_base_url(&self.openai_base_url);
                match self.openai_dimensions {
                    Some(dims) => Ok(Arc::new(embedder.with_dimensions(dims))),
                    None if self.openai_model == DEFAULT_EMBEDDING_MODEL => Ok(Arc::new(embedder)),
                    None => bail!(
                        "--openai-dimensions is required with embedding model {}",
                        self.openai_model
                    ),
                }
            }
        }
    }

    /// The corpus file as one document, or the sample policy.
    pub fn documents(&self) -> Result<Vec<Document>> {
        match &self.corpus {
            Some(path) => Ok(vec![load_document(path)?]),
            None => {
                Ok(vec![Document::new("policy", SAMPLE_POLICY).with_metadata("source", "policy")])
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>, env: &str, flag: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("{env} is not set (export it, add it to .env, or pass {flag})"),
    }
}

/// Read a text file into a [`Document`] whose id is the file name.
pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus {}", path.display()))?;
    let id = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(Document::new(id, text)
        .with_metadata("source", path.display().to_string())
        .with_source_uri(path.display().to_string()))
}

/// Index the documents and answer the question.
pub async fn run(cli: &Cli) -> Result<Answer> {
    let documents = cli.documents()?;
    let qa = QaOrchestrator::builder()
        .config(cli.rag_config()?)
        .embedding_provider(cli.embedder()?)
        .generator(cli.generator()?)
        .index(&documents)
        .await
        .context("failed to index documents")?;

    info!(backend = ?cli.backend, embedder = ?cli.embedder, "asking");
    let answer = qa.ask(&cli.question, cli.top_k).await.context("failed to answer question")?;
    Ok(answer)
}

/// Render the answer the way the binary prints it.
pub fn render(cli: &Cli, answer: &Answer) -> String {
    let mut out = format!("Q: {}\nA: {}", cli.question, answer.text);
    if cli.show_sources {
        out.push_str(&format!("\nSources: {}", answer.context.sources().join(", ")));
    }
    out
}
