//! DeepSeek chat-completions client.
//!
//! Calls the DeepSeek `/chat/completions` endpoint directly with
//! `reqwest`. The system prompt and retrieved context travel as the
//! system message; the user's question as the user message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::CompletionModel;

/// The default DeepSeek API base URL.
pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";

/// The default chat model.
const DEFAULT_MODEL: &str = "deepseek-chat";

/// Sampling temperature used for catalog answering.
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// A [`CompletionModel`] backed by the DeepSeek chat API.
///
/// # Example
///
/// ```rust,ignore
/// use shopqa_model::DeepSeekClient;
///
/// let model = DeepSeekClient::new(std::env::var("DEEPSEEK_API_KEY")?)?;
/// let answer = model.complete(system, context, "best headphones under $100?").await?;
/// ```
#[derive(Debug)]
pub struct DeepSeekClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl DeepSeekClient {
    /// Create a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Auth`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::Auth("API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEEPSEEK_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a new client using the `DEEPSEEK_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPSEEK_API_KEY")
            .map_err(|_| ModelError::Auth("DEEPSEEK_API_KEY environment variable not set".into()))?;
        Self::new(api_key)
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the API base URL (for self-hosted gateways and tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ── DeepSeek API request/response types ────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── CompletionModel implementation ─────────────────────────────────

#[async_trait]
impl CompletionModel for DeepSeekClient {
    async fn complete(&self, system: &str, context: &str, input: &str) -> Result<String> {
        debug!(
            model = %self.model,
            context_len = context.len(),
            input_len = input.len(),
            "requesting completion"
        );

        let system_message = format!("{system}\n\nContext: {context}");
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &system_message },
                ChatMessage { role: "user", content: input },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "completion request failed");
                ModelError::Request(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status, "completion API error");
            return Err(ModelError::Api { status, message });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::MalformedResponse("response contained no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let err = DeepSeekClient::new("").unwrap_err();
        assert!(matches!(err, ModelError::Auth(_)));
    }

    #[test]
    fn builder_overrides_apply() {
        let client = DeepSeekClient::new("sk-test")
            .unwrap()
            .with_model("deepseek-reasoner")
            .with_temperature(0.0)
            .with_base_url("http://localhost:9000");
        assert_eq!(client.model, "deepseek-reasoner");
        assert_eq!(client.temperature, 0.0);
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
