//! Error types for the `groundqa-rag` crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a call to an external backend (embedder or generator) failed.
///
/// Only [`Timeout`](FailureKind::Timeout) and [`Network`](FailureKind::Network)
/// are transient. Authentication failures and explicit backend errors are
/// reported once and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The call did not complete within the configured timeout.
    Timeout,
    /// The backend could not be reached (connect, DNS, broken connection).
    Network,
    /// The backend rejected the credential.
    Authentication,
    /// The backend answered with an explicit error.
    Backend,
}

impl FailureKind {
    /// Whether a call failing this way may be retried.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::Backend => "backend",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in GroundQA operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RagError {
    /// Caller-supplied parameters violate a precondition.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A vector's length disagrees with the index dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality of the index.
        expected: usize,
        /// The length of the offending vector.
        actual: usize,
    },

    /// The embedding backend could not produce a vector.
    #[error("Embedding unavailable ({provider}, {kind}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// How the call failed.
        kind: FailureKind,
        /// A description of the failure.
        message: String,
    },

    /// The LLM backend could not produce an answer.
    #[error("Generation unavailable ({provider}, {kind}): {message}")]
    GenerationUnavailable {
        /// The generator that produced the error.
        provider: String,
        /// How the call failed.
        kind: FailureKind,
        /// A description of the failure.
        message: String,
    },

    /// A backend reported success but its body could not be interpreted.
    #[error("Malformed response ({provider}): {message}")]
    MalformedResponse {
        /// The backend that produced the body.
        provider: String,
        /// What was wrong with it.
        message: String,
        /// The raw offending payload.
        payload: String,
    },
}

impl RagError {
    /// Build an [`InvalidConfiguration`](RagError::InvalidConfiguration) error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Build an [`EmbeddingUnavailable`](RagError::EmbeddingUnavailable) error.
    pub fn embedding(
        provider: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self::EmbeddingUnavailable { provider: provider.into(), kind, message: message.into() }
    }

    /// Build a [`GenerationUnavailable`](RagError::GenerationUnavailable) error.
    pub fn generation(
        provider: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self::GenerationUnavailable { provider: provider.into(), kind, message: message.into() }
    }

    /// Build a [`MalformedResponse`](RagError::MalformedResponse) error.
    pub fn malformed(
        provider: impl Into<String>,
        message: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
            payload: payload.into(),
        }
    }

    /// The failure kind of a backend error, if this is one.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::EmbeddingUnavailable { kind, .. } | Self::GenerationUnavailable { kind, .. } => {
                Some(*kind)
            }
            _ => None,
        }
    }

    /// Whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.failure_kind().is_some_and(FailureKind::is_transient)
    }

    /// Whether this error is a caller mistake rather than a backend failure.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_) | Self::DimensionMismatch { .. })
    }
}

/// A convenience result type for GroundQA operations.
pub type Result<T> = std::result::Result<T, RagError>;
