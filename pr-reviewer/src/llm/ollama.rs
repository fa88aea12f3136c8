//! Ollama shim for local inference via `POST {base}/api/chat`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ProviderError, ReviewResult};
use crate::llm::LlmConfig;
use crate::llm::open_ai::base_url;

const DEFAULT_BASE: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(cfg: &LlmConfig) -> ReviewResult<Self> {
        Ok(Self {
            http: Client::new(),
            base: base_url(cfg, DEFAULT_BASE),
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
        let url = format!("{}/api/chat", self.base);
        debug!(model = %self.model, %url, "llm: ollama chat");

        let resp: ChatResponse = self
            .http
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![
                    Message {
                        role: "system",
                        content: system,
                    },
                    Message {
                        role: "user",
                        content: user,
                    },
                ],
                stream: false,
                options: Options {
                    temperature,
                    num_predict: max_tokens,
                },
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.message.map(|m| m.content).ok_or_else(|| {
            ProviderError::InvalidResponse("ollama chat response carried no message".into()).into()
        })
    }
}
