//! SQL generation through an LLM completion service.

use crate::otel::llm_span;
use crate::types::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::Instrument;

/// Produces raw SQL text (or the unanswerable sentinel) from a prompt.
///
/// Implementations perform exactly one round trip per call.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Send the prompt and return the trimmed response text.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` on transport, timeout or model failures
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Model identifier for logging.
    fn model_name(&self) -> &str;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server (`/api/chat`)
    Ollama,
    /// OpenAI-compatible chat completions
    OpenAI,
    /// Anthropic messages API
    Anthropic,
}

impl LlmProvider {
    /// Infer the provider from a model name.
    ///
    /// `claude*` → Anthropic, `gpt-*`/`o1*`/`o3*` → OpenAI, anything else is
    /// treated as a local Ollama model (`llama3`, `mistral`, ...).
    pub fn from_model(model: &str) -> Self {
        if model.starts_with("claude") || model.starts_with("anthropic") {
            Self::Anthropic
        } else if model.starts_with("gpt-") || model.starts_with("o1") || model.starts_with("o3") {
            Self::OpenAI
        } else {
            Self::Ollama
        }
    }

    /// Default endpoint URL.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434/api/chat",
            Self::OpenAI => "https://api.openai.com/v1/chat/completions",
            Self::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    /// Value for the `gen_ai.system` span attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

/// Ollama chat response.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

/// OpenAI API response.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

/// Anthropic API response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

const MAX_ERROR_BODY: usize = 512;

/// HTTP-backed generator for Ollama, OpenAI and Anthropic.
pub struct LlmQueryGenerator {
    provider: LlmProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: Client,
}

impl LlmQueryGenerator {
    /// Create a generator with an explicit request timeout.
    ///
    /// # Arguments
    ///
    /// * `provider` - Wire protocol to speak
    /// * `model` - Model name (e.g., "llama3", "gpt-4o", "claude-3-5-sonnet-20241022")
    /// * `endpoint` - Override for the provider's default URL
    /// * `api_key` - Required by OpenAI and Anthropic, ignored by Ollama
    /// * `timeout` - Whole-request timeout
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built
    pub fn new(
        provider: LlmProvider,
        model: impl Into<String>,
        endpoint: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            provider,
            model: model.into(),
            endpoint: endpoint.unwrap_or_else(|| provider.default_endpoint().to_string()),
            api_key,
            temperature: 0.0,
            max_tokens: 1024,
            timeout,
            client,
        })
    }

    /// Set sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit (OpenAI, Anthropic).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Provider in use.
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Endpoint in use.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// JSON body for one request.
    fn request_body(&self, prompt: &str) -> serde_json::Value {
        match self.provider {
            LlmProvider::Ollama => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "stream": false,
                "options": {"temperature": self.temperature}
            }),
            LlmProvider::OpenAI => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }),
            LlmProvider::Anthropic => json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": self.temperature
            }),
        }
    }

    /// Extract the completion text from a successful response body.
    fn parse_response(provider: LlmProvider, body: &str) -> Result<String, GenerationError> {
        let malformed = |e: serde_json::Error| GenerationError::MalformedResponse(e.to_string());

        let text = match provider {
            LlmProvider::Ollama => {
                let parsed: OllamaResponse = serde_json::from_str(body).map_err(malformed)?;
                parsed.message.content
            }
            LlmProvider::OpenAI => {
                let parsed: OpenAIResponse = serde_json::from_str(body).map_err(malformed)?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or(GenerationError::EmptyResponse)?
            }
            LlmProvider::Anthropic => {
                let parsed: AnthropicResponse = serde_json::from_str(body).map_err(malformed)?;
                parsed
                    .content
                    .into_iter()
                    .map(|c| c.text)
                    .collect::<Vec<_>>()
                    .join("")
            }
        };

        let text = strip_markdown(&text);
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }

    async fn send(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt));

        match (self.provider, &self.api_key) {
            (LlmProvider::OpenAI, Some(key)) => {
                request = request.header("Authorization", format!("Bearer {}", key));
            }
            (LlmProvider::Anthropic, Some(key)) => {
                request = request
                    .header("x-api-key", key)
                    .header("anthropic-version", "2023-06-01");
            }
            _ => {}
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_response(self.provider, &body)
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl QueryGenerator for LlmQueryGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let span = llm_span(self.provider.as_str(), &self.model);

        async {
            let result = self.send(prompt).await;
            match &result {
                Ok(text) => tracing::debug!(chars = text.len(), "LLM completion received"),
                Err(e) => tracing::warn!(error = %e, "LLM completion failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Fence info strings recognised on the opening line.
const INFO_STRINGS: &[&str] = &["sql", "mysql", "sqlite", "postgresql", "postgres"];

fn is_info_string(token: &str) -> bool {
    INFO_STRINGS.iter().any(|s| token.eq_ignore_ascii_case(s))
}

/// Trim whitespace and strip one surrounding markdown code fence.
///
/// Handles:
/// - ```sql ... ``` (multi-line or single-line)
/// - ```SQL ... ```
/// - ``` ... ```
///
/// Only a known info string is dropped after the opening fence; any other
/// text there is part of the body.
pub fn strip_markdown(text: &str) -> String {
    let text = text.trim();

    let Some(rest) = text.strip_prefix("```") else {
        return text.to_string();
    };

    let body = match rest.find('\n') {
        Some(i) if rest[..i].trim().is_empty() || is_info_string(rest[..i].trim()) => {
            &rest[i + 1..]
        }
        _ => match rest.split_once(char::is_whitespace) {
            Some((token, tail)) if is_info_string(token) => tail,
            _ => rest,
        },
    };

    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim().to_string()
}
