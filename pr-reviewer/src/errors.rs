//! Crate-wide error hierarchy for pr-reviewer.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Provider-aware mapping (401→Unauthorized, 429→RateLimited, 5xx→Server, etc.).
//! - No dynamic dispatch, no async-trait, ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReviewResult<T> = Result<T, Error>;

/// Root error type for the pr-reviewer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub / LLM provider related failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Unified diff parsing failure.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Model output not recoverable as structured data.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Configuration problems (bad/missing tokens, prompt files, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input validation errors (bad IDs, unsupported events, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Detailed provider-specific error used inside the HTTP client layers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// JSON deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Unified diff parser errors.
///
/// These are recovered locally: the affected file is skipped, the rest of
/// the pull request is still reviewed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid hunk header: {0}")]
    InvalidHunkHeader(String),

    #[error("patch contains no hunk header")]
    MissingHunkHeader,
}

/// Model response extraction errors.
///
/// Raised only after the full recovery ladder (fence strip → direct parse →
/// bracket scan) is exhausted, or when the recovered value has no usable
/// review shape. The reconciler downgrades these to a general fallback
/// comment; they are never fatal to the invocation.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model returned an empty response")]
    EmptyResponse,

    /// No parseable JSON anywhere in the output. Keeps the raw text so the
    /// fallback path can post it (truncated) as a general comment.
    #[error("model response did not contain a valid JSON object/array")]
    NoJsonFound { raw: String },

    #[error("model response is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("model response has invalid shape: {0}")]
    InvalidShape(String),
}

/// Configuration and setup errors (API base, missing token, prompt files).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing GitHub token")]
    MissingToken,

    #[error("unknown llm provider: {0}")]
    UnknownProvider(String),

    #[error("missing api key for llm provider {0}")]
    MissingApiKey(&'static str),

    #[error("cannot read prompt file {path}: {source}")]
    PromptFile {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

// ===== Conversions for `?` ergonomics =====

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Provider(ProviderError::from(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Provider(ProviderError::Serde(e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => ProviderError::Unauthorized,
                403 => ProviderError::Forbidden,
                404 => ProviderError::NotFound,
                429 => ProviderError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => ProviderError::Server(code),
                _ => ProviderError::HttpStatus(code),
            };
        }
        ProviderError::Network(e.to_string())
    }
}
