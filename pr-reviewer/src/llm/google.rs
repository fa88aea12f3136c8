//! Google Generative Language shim (`:generateContent`).
//!
//! The API takes a single text part; system and user messages are joined
//! with a blank line, matching the prompt contract the default model was
//! tuned against. Sampling parameters ride on provider defaults.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConfigError, ProviderError, ReviewResult};
use crate::llm::LlmConfig;

#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GoogleClient {
    pub fn new(cfg: &LlmConfig) -> ReviewResult<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey("google"))?;
        let url = cfg.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                cfg.model
            )
        });
        Ok(Self {
            http: Client::new(),
            url,
            api_key,
        })
    }

    pub async fn complete(&self, system: &str, user: &str) -> ReviewResult<String> {
        debug!(url = %self.url, "llm: google generateContent");

        let text = format!("{system}\n\n{user}");
        let resp: GenerateResponse = self
            .http
            .post(&self.url)
            .header("X-goog-api-key", &self.api_key)
            .json(&GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part { text: &text }],
                }],
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("generateContent returned no candidates".into())
                    .into()
            })
    }
}
