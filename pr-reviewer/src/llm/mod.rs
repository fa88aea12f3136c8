//! LLM facade w/o async-trait or dynamic trait objects.
//!
//! One enum `LlmClient` with concrete per-provider implementations and a
//! single operation: `complete(system, user, max_tokens, temperature)`
//! returning the provider's raw text blob. The pipeline never depends on
//! which provider backs the call; retry/backoff is left to operators.

pub mod google;
pub mod ollama;
pub mod open_ai;
pub mod open_router;

use crate::errors::{ConfigError, ReviewResult};

/// Supported inference backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Google,
    OpenAi,
    OpenRouter,
    Ollama,
}

impl LlmProviderKind {
    /// Parses the `LLM_PROVIDER` setting (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Model invocation settings, fixed for one review invocation.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub kind: LlmProviderKind,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Endpoint override; each provider has its own default.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl LlmConfig {
    /// Reads provider settings from the environment once, at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let kind = LlmProviderKind::parse(
            &std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "google".to_string()),
        )?;
        let model = std::env::var("MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let max_tokens = parse_env("MAX_TOKENS", 2500u32)?;
        let temperature = parse_env("TEMPERATURE", 0.2f32)?;

        let (endpoint_var, key_var) = match kind {
            LlmProviderKind::Google => ("BASE_URL", Some("AI_API_KEY")),
            LlmProviderKind::OpenAi => ("OPENAI_BASE_URL", Some("OPENAI_API_KEY")),
            LlmProviderKind::OpenRouter => ("OPENROUTER_BASE_URL", Some("OPENROUTER_API_KEY")),
            LlmProviderKind::Ollama => ("OLLAMA_BASE_URL", None),
        };

        Ok(Self {
            kind,
            model,
            max_tokens,
            temperature,
            endpoint: std::env::var(endpoint_var).ok(),
            api_key: key_var.and_then(|k| std::env::var(k).ok()),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

/// Concrete LLM client (enum-dispatch).
#[derive(Debug, Clone)]
pub enum LlmClient {
    Google(google::GoogleClient),
    OpenAi(open_ai::OpenAiClient),
    OpenRouter(open_router::OpenRouterClient),
    Ollama(ollama::OllamaClient),
}

impl LlmClient {
    /// Constructs a concrete client, validating provider credentials.
    pub fn from_config(cfg: &LlmConfig) -> ReviewResult<Self> {
        Ok(match cfg.kind {
            LlmProviderKind::Google => Self::Google(google::GoogleClient::new(cfg)?),
            LlmProviderKind::OpenAi => Self::OpenAi(open_ai::OpenAiClient::new(cfg)?),
            LlmProviderKind::OpenRouter => Self::OpenRouter(open_router::OpenRouterClient::new(cfg)?),
            LlmProviderKind::Ollama => Self::Ollama(ollama::OllamaClient::new(cfg)?),
        })
    }

    /// Single inference call; returns the provider's raw text output.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> ReviewResult<String> {
        match self {
            Self::Google(c) => c.complete(system, user).await,
            Self::OpenAi(c) => c.complete(system, user, max_tokens, temperature).await,
            Self::OpenRouter(c) => c.complete(system, user, max_tokens, temperature).await,
            Self::Ollama(c) => c.complete(system, user, max_tokens, temperature).await,
        }
    }
}
