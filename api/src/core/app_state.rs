use pr_reviewer::config::ReviewConfig;
use pr_reviewer::errors::ConfigError;

/// Shared application state: the review configuration, resolved once at
/// startup and treated as immutable for the process lifetime.
#[derive(Debug)]
pub struct AppState {
    pub review_config: ReviewConfig,
}

impl AppState {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            review_config: ReviewConfig::from_env()?,
        })
    }
}
