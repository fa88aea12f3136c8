//! Invocation configuration.
//!
//! Everything the pipeline needs is resolved from the environment exactly
//! once, at startup, into an immutable value that is threaded through the
//! stages. Downstream code never reads process-wide state ad hoc.

use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::github::GithubConfig;
use crate::llm::LlmConfig;

/// Immutable settings for pull-request review invocations.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub github: GithubConfig,
    pub llm: LlmConfig,
    /// Optional glob narrowing of reviewed files; empty selects all.
    pub file_globs: Vec<String>,
    /// System guardrails prompt (`review.md`).
    pub system_prompt: String,
    /// Review rubric text (`rubric.md`).
    pub rubric: String,
    /// Optional comment-template text (`comment-template.md`).
    pub comment_template: Option<String>,
}

impl ReviewConfig {
    /// Builds the full configuration from environment variables and the
    /// prompt files under `PROMPTS_DIR` (default `prompts/`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let github = GithubConfig::from_env()?;
        let llm = LlmConfig::from_env()?;

        let file_globs = std::env::var("FILE_GLOBS")
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let prompts_dir =
            PathBuf::from(std::env::var("PROMPTS_DIR").unwrap_or_else(|_| "prompts".to_string()));

        let system_prompt = read_prompt(&prompts_dir.join("review.md"))?;
        let rubric = read_prompt(&prompts_dir.join("rubric.md"))?;
        // The template is an optional refinement; reviews run without it.
        let comment_template = read_prompt(&prompts_dir.join("comment-template.md")).ok();

        Ok(Self {
            github,
            llm,
            file_globs,
            system_prompt,
            rubric,
            comment_template,
        })
    }
}

fn read_prompt(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::PromptFile {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_prompt_file_names_the_path() {
        let err = read_prompt(Path::new("definitely/not/here.md")).unwrap_err();
        let ConfigError::PromptFile { path, .. } = err else {
            panic!("expected PromptFile error");
        };
        assert!(path.contains("here.md"));
    }
}
