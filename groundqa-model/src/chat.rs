//! Chat-completions generator for OpenAI-compatible APIs (Groq by default).

use async_trait::async_trait;
use groundqa_rag::{Generator, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::http::{error_detail, status_kind, transport_kind};

/// Groq's OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The default Groq chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Configuration for a [`ChatCompletionGenerator`].
///
/// # Example
///
/// ```rust
/// use groundqa_model::ChatConfig;
///
/// let config = ChatConfig::groq("gsk-...").with_temperature(0.0);
/// assert_eq!(config.model, "llama-3.1-8b-instant");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Bearer credential sent with every request.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// API base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Sampling temperature. The backend default applies when unset.
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
}

impl ChatConfig {
    /// Configure any OpenAI-compatible endpoint.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Configure Groq with the default model.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_GROQ_MODEL, GROQ_API_BASE)
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// A [`Generator`] that sends the prompt as a single user message to a
/// `/chat/completions` endpoint and returns the first choice's content.
pub struct ChatCompletionGenerator {
    client: reqwest::Client,
    config: ChatConfig,
    endpoint: String,
}

impl std::fmt::Debug for ChatCompletionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionGenerator")
            .field("model", &self.config.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ChatCompletionGenerator {
    /// Create a generator from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if the API key, model or
    /// base URL is empty, or the temperature is negative or not finite.
    pub fn new(config: ChatConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::invalid("chat API key must not be empty"));
        }
        if config.model.is_empty() {
            return Err(RagError::invalid("chat model must not be empty"));
        }
        if config.base_url.is_empty() {
            return Err(RagError::invalid("chat base URL must not be empty"));
        }
        if let Some(t) = config.temperature {
            if !t.is_finite() || t < 0.0 {
                return Err(RagError::invalid(format!("temperature must be non-negative, got {t}")));
            }
        }

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Ok(Self { client: reqwest::Client::new(), config, endpoint })
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

#[async_trait]
impl Generator for ChatCompletionGenerator {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "chat completion request");

        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.config.model, error = %e, "request failed");
                RagError::generation(
                    self.name(),
                    transport_kind(&e),
                    format!("request failed: {e}"),
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            RagError::generation(
                self.name(),
                transport_kind(&e),
                format!("reading body failed: {e}"),
            )
        })?;

        if !status.is_success() {
            error!(model = %self.config.model, %status, "API error");
            return Err(RagError::generation(
                self.name(),
                status_kind(status),
                format!("API returned {status}: {}", error_detail(body)),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            RagError::malformed(self.name(), format!("failed to parse response: {e}"), body.clone())
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                RagError::malformed(self.name(), "response has no message content", body)
            })
    }
}
