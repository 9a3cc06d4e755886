//! Deterministic test doubles for the embedding and generation seams.
//!
//! - [`FixedEmbedder`] returns hand-chosen vectors by keyword.
//! - [`MockGenerator`] replays a scripted sequence of replies and records prompts.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{FailureKind, RagError, Result};
use crate::generation::Generator;

/// An embedder that maps texts to hand-chosen vectors.
///
/// A text receives the vector of the first registered keyword it contains
/// (case-insensitive), or the fallback vector when none matches. Calls can be
/// made to fail a fixed number of times to exercise retry paths.
#[derive(Debug)]
pub struct FixedEmbedder {
    dimensions: usize,
    rules: Vec<(String, Vec<f32>)>,
    fallback: Vec<f32>,
    failures: Mutex<VecDeque<FailureKind>>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    /// Create an embedder whose fallback is the zero vector.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            rules: Vec::new(),
            fallback: vec![0.0; dimensions],
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Map texts containing `keyword` to `vector`.
    pub fn with_vector(mut self, keyword: impl Into<String>, vector: Vec<f32>) -> Self {
        self.rules.push((keyword.into().to_lowercase(), vector));
        self
    }

    /// Set the vector used when no keyword matches.
    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = vector;
        self
    }

    /// Make the next call fail with `kind`. Queued failures are consumed in order.
    pub fn fail_next(self, kind: FailureKind) -> Self {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).push_back(kind);
        self
    }

    /// Number of `embed`/`embed_batch` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map_or_else(|| self.fallback.clone(), |(_, vector)| vector.clone())
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match failure {
            Some(kind) => Err(RagError::embedding("fixed", kind, "scripted failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.begin_call()?;
        Ok(self.lookup(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.begin_call()?;
        Ok(texts.iter().map(|text| self.lookup(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// One scripted [`MockGenerator`] reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail with `GenerationUnavailable` of this kind.
    Fail(FailureKind),
    /// Fail with `MalformedResponse` carrying this payload.
    Malformed(String),
    /// Never complete; the caller's timeout decides the outcome.
    Hang,
}

/// A generator that replays scripted replies.
///
/// Once the script is exhausted every call returns the default reply.
#[derive(Debug)]
pub struct MockGenerator {
    name: String,
    script: Mutex<VecDeque<MockReply>>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    /// Create a generator that always answers `"mock answer"`.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            default_reply: "mock answer".to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Set the reply used once the script is exhausted.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Append a reply to the script.
    pub fn then(self, reply: MockReply) -> Self {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
        self
    }

    /// Append a text reply to the script.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.then(MockReply::Text(text.into()))
    }

    /// Append a failure to the script.
    pub fn then_fail(self, kind: FailureKind) -> Self {
        self.then(MockReply::Fail(kind))
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).push(prompt.to_string());
        let next = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();

        match next {
            None => Ok(self.default_reply.clone()),
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(kind)) => {
                Err(RagError::generation(&self.name, kind, "scripted failure"))
            }
            Some(MockReply::Malformed(payload)) => {
                Err(RagError::malformed(&self.name, "scripted malformed body", payload))
            }
            Some(MockReply::Hang) => std::future::pending().await,
        }
    }
}
