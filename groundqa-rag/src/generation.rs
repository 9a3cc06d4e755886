//! Generator trait for LLM backends.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that turns a composed prompt into generated text.
///
/// Backend-specific options (model, credential, sampling parameters) are
/// fixed when the generator is constructed, so every variant exposes the same
/// single-call contract.
///
/// Failures are reported as
/// [`RagError::GenerationUnavailable`](crate::RagError::GenerationUnavailable)
/// with a [`FailureKind`](crate::FailureKind) that tells the caller whether a
/// retry may help, or as
/// [`RagError::MalformedResponse`](crate::RagError::MalformedResponse) when the
/// backend answered successfully with a body that could not be read.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Name used in logs and errors, usually the model identifier.
    fn name(&self) -> &str;

    /// Generate text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
