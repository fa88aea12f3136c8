//! OpenAI chat-completions shim.
//!
//! Minimal, non-streaming wrapper around `POST {base}/chat/completions`.
//! The wire shapes here are shared with the OpenRouter shim, which speaks
//! the same protocol at a different base URL.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConfigError, ProviderError, ReviewResult};
use crate::llm::LlmConfig;

const DEFAULT_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    base: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}

impl OpenAiClient {
    pub fn new(cfg: &LlmConfig) -> ReviewResult<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey("openai"))?;
        Ok(Self {
            http: Client::new(),
            base: base_url(cfg, DEFAULT_BASE),
            api_key,
            model: cfg.model.clone(),
        })
    }

    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> ReviewResult<String> {
        let url = format!("{}/chat/completions", self.base);
        debug!(model = %self.model, %url, "llm: openai chat completion");

        let resp: ChatResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: user,
                    },
                ],
                temperature,
                max_tokens,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_choice_text(resp)
    }
}

/// Extracts the first choice's text, erroring on an empty choice list.
pub(crate) fn first_choice_text(resp: ChatResponse) -> ReviewResult<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            ProviderError::InvalidResponse("chat completion carried no message content".into())
                .into()
        })
}

/// Trailing-slash-tolerant base URL resolution.
pub(crate) fn base_url(cfg: &LlmConfig, default: &str) -> String {
    cfg.endpoint
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}
