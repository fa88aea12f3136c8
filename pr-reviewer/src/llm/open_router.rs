//! OpenRouter shim — chat-completions protocol at the OpenRouter base URL.

use reqwest::Client;
use tracing::debug;

use crate::errors::{ConfigError, ReviewResult};
use crate::llm::LlmConfig;
use crate::llm::open_ai::{ChatMessage, ChatRequest, ChatResponse, base_url, first_choice_text};

const DEFAULT_BASE: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    base: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(cfg: &LlmConfig) -> ReviewResult<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey("openrouter"))?;
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
        debug!(model = %self.model, %url, "llm: openrouter chat completion");

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
