//! Raw-completion generator for cloud "invoke model" endpoints.
//!
//! The request body is `{prompt, max_gen_len, temperature, top_p}` and the
//! answer is read from the response's `generation` or `outputs` field, as
//! served by Bedrock's Llama models.

use async_trait::async_trait;
use groundqa_rag::{Generator, RagError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::http::{error_detail, status_kind, transport_kind};

/// The default region.
pub const DEFAULT_REGION: &str = "ap-south-1";

/// The default model identifier.
pub const DEFAULT_MODEL_ID: &str = "meta.llama3-8b-instruct-v1:0";

/// Configuration for an [`InvokeModelGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeConfig {
    /// Bearer API key for the runtime endpoint.
    pub api_key: String,
    /// Region used to derive the endpoint host.
    pub region: String,
    /// Model identifier placed in the request path.
    pub model_id: String,
    /// Overrides the derived `https://bedrock-runtime.{region}.amazonaws.com` base.
    pub endpoint: Option<String>,
    /// Maximum number of tokens to generate.
    pub max_gen_len: u32,
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,
    /// Nucleus sampling mass in `[0, 1]`.
    pub top_p: f32,
}

impl InvokeConfig {
    /// Default region and model, 512 tokens, temperature 0.7, top_p 0.9.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            region: DEFAULT_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            endpoint: None,
            max_gen_len: 512,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the model identifier.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Send requests to `endpoint` instead of the regional host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the generation length limit.
    pub fn with_max_gen_len(mut self, max_gen_len: u32) -> Self {
        self.max_gen_len = max_gen_len;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the nucleus sampling mass.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// The full `.../model/{model_id}/invoke` URL.
    pub fn invoke_url(&self) -> String {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        };
        format!("{base}/model/{}/invoke", self.model_id)
    }

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if the API key, region or
    /// model is empty, `max_gen_len` is zero, or `temperature`/`top_p` lie
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(RagError::invalid("invoke API key must not be empty"));
        }
        if self.region.is_empty() || self.model_id.is_empty() {
            return Err(RagError::invalid("region and model_id must not be empty"));
        }
        if self.max_gen_len == 0 {
            return Err(RagError::invalid("max_gen_len must be greater than zero"));
        }
        for (name, value) in [("temperature", self.temperature), ("top_p", self.top_p)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RagError::invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    prompt: &'a str,
    max_gen_len: u32,
    temperature: f32,
    top_p: f32,
}

/// A [`Generator`] for raw-completion invoke endpoints.
pub struct InvokeModelGenerator {
    client: reqwest::Client,
    config: InvokeConfig,
    url: String,
}

impl std::fmt::Debug for InvokeModelGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokeModelGenerator")
            .field("model_id", &self.config.model_id)
            .field("url", &self.url)
            .finish()
    }
}

impl InvokeModelGenerator {
    /// Create a generator from `config`.
    ///
    /// # Errors
    ///
    /// See [`InvokeConfig::validate`].
    pub fn new(config: InvokeConfig) -> Result<Self> {
        config.validate()?;
        let url = config.invoke_url();
        Ok(Self { client: reqwest::Client::new(), config, url })
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &InvokeConfig {
        &self.config
    }
}

#[async_trait]
impl Generator for InvokeModelGenerator {
    fn name(&self) -> &str {
        &self.config.model_id
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model_id = %self.config.model_id, prompt_len = prompt.len(), "invoke request");

        let request = InvokeRequest {
            prompt,
            max_gen_len: self.config.max_gen_len,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model_id = %self.config.model_id, error = %e, "request failed");
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
            error!(model_id = %self.config.model_id, %status, "API error");
            return Err(RagError::generation(
                self.name(),
                status_kind(status),
                format!("API returned {status}: {}", error_detail(body)),
            ));
        }

        normalize_completion(self.name(), &body)
    }
}

/// Extract the completion text from an invoke response body.
///
/// A string `generation` field wins. Otherwise `outputs` must be an array
/// whose elements are strings or objects with a string `text` field; the
/// pieces are joined with newlines. Anything else is a
/// [`RagError::MalformedResponse`] carrying `body`.
///
/// ```rust
/// use groundqa_model::normalize_completion;
///
/// let text = normalize_completion("llama", r#"{"generation": "three ideas..."}"#).unwrap();
/// assert_eq!(text, "three ideas...");
/// ```
pub fn normalize_completion(provider: &str, body: &str) -> Result<String> {
    let malformed = |message: &str| RagError::malformed(provider, message, body);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| malformed(&format!("response is not JSON: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(malformed("response is not a JSON object"));
    };

    match fields.get("generation") {
        Some(Value::String(text)) => return Ok(text.clone()),
        Some(_) => warn!(provider, "ignoring non-string generation field"),
        None => {}
    }

    let Some(outputs) = fields.get("outputs") else {
        return Err(malformed("response has neither generation nor outputs"));
    };
    let Value::Array(items) = outputs else {
        return Err(malformed("outputs is not an array"));
    };

    let mut pieces = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(text) => pieces.push(text.as_str()),
            Value::Object(output) => match output.get("text") {
                Some(Value::String(text)) => pieces.push(text.as_str()),
                _ => return Err(malformed("outputs entry has no text")),
            },
            _ => return Err(malformed("outputs entry is neither text nor object")),
        }
    }
    Ok(pieces.join("\n"))
}
