//! Chat-completion client
//!
//! Agents talk to the model through the [`LanguageModel`] trait. The
//! production implementation is [`OpenRouterClient`]; tests substitute a
//! scripted model. `generate` never fails: every error is logged and
//! collapses to an empty string, which the agents treat as "use fallback".

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::utils::truncate_chars;

/// Longest response excerpt written to the log
const LOG_EXCERPT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is not configured")]
    MissingCredential,

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Response did not contain assistant content")]
    NoContent,
}

/// One completion request. Unset parameters take the client's configured
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text generation backend used by the agents
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Assistant text for `request`, or an empty string on any failure
    async fn generate(&self, request: &LlmRequest) -> String;
}

/// OpenRouter-compatible chat-completion client
pub struct OpenRouterClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenRouterClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LlmError::Transport)?;
        Ok(Self { http, config })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Request body for one completion
    pub fn request_body(&self, request: &LlmRequest) -> Value {
        json!({
            "model": request.model.as_deref().unwrap_or(&self.config.model),
            "messages": [{"role": "user", "content": request.prompt}],
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": request.temperature.unwrap_or(self.config.temperature),
        })
    }

    /// Send exactly one request. No retry.
    pub async fn try_generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let api_key = self.api_key().ok_or(LlmError::MissingCredential)?;

        let response = self
            .http
            .post(&self.config.base_url)
            .bearer_auth(api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(LlmError::Transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, LOG_EXCERPT_CHARS).to_string(),
            });
        }

        let data: Value = response.json().await.map_err(LlmError::Decode)?;
        log::debug!(
            "Raw completion response: {}",
            truncate_chars(&data.to_string(), LOG_EXCERPT_CHARS)
        );

        extract_content(&data).ok_or_else(|| {
            log::warn!(
                "Completion response had no assistant content: {}",
                truncate_chars(&data.to_string(), LOG_EXCERPT_CHARS)
            );
            LlmError::NoContent
        })
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    async fn generate(&self, request: &LlmRequest) -> String {
        match self.try_generate(request).await {
            Ok(text) => text,
            Err(LlmError::MissingCredential) => {
                log::debug!("Skipping completion request: API key is not configured");
                String::new()
            }
            Err(e) => {
                log::warn!("Completion request failed: {}", e);
                String::new()
            }
        }
    }
}

/// Assistant text from a completion body.
///
/// Looks at `choices[0].message.content`, then top-level `text`, then
/// `choices[0].text`. Null or blank candidates fall through to the next
/// shape; non-string content is stringified.
pub fn extract_content(data: &Value) -> Option<String> {
    [
        data.pointer("/choices/0/message/content"),
        data.get("text"),
        data.pointer("/choices/0/text"),
    ]
    .into_iter()
    .flatten()
    .find_map(content_text)
}

fn content_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
