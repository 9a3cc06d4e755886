//! # groundqa-model
//!
//! HTTP backends for GroundQA's [`Generator`](groundqa_rag::Generator) and
//! [`EmbeddingProvider`](groundqa_rag::EmbeddingProvider) seams.
//!
//! ## Overview
//!
//! - [`ChatCompletionGenerator`] - OpenAI-compatible chat completions (Groq by default)
//! - [`InvokeModelGenerator`] - raw-completion "invoke model" endpoints (Bedrock Llama)
//! - [`OpenAiEmbedder`] - OpenAI-compatible `/embeddings`
//!
//! Backends take explicit configuration structs; reading credentials from the
//! environment is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use groundqa_model::{ChatCompletionGenerator, ChatConfig};
//!
//! let generator = ChatCompletionGenerator::new(ChatConfig::groq("gsk-...")).unwrap();
//! ```
//!
//! ## Errors
//!
//! Transport failures map to `Network` or `Timeout`, 401/403 responses to
//! `Authentication`, and other error statuses to `Backend`. A success status
//! with an unreadable body is a `MalformedResponse` carrying the raw body.

pub mod chat;
pub mod embedding;
mod http;
pub mod invoke;

pub use chat::{ChatCompletionGenerator, ChatConfig};
pub use embedding::OpenAiEmbedder;
pub use invoke::{InvokeConfig, InvokeModelGenerator, normalize_completion};
