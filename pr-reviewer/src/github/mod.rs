//! GitHub REST v3 client for the review pipeline.
//!
//! Endpoints used:
//! - GET  /repos/{owner}/{repo}/pulls/{number}/files   (paginated; "patch" is unified diff)
//! - GET  /repos/{owner}/{repo}/contents/{path}?ref=   (base64 content at a revision)
//! - POST /repos/{owner}/{repo}/pulls/{number}/reviews (review submission)
//! - POST /repos/{owner}/{repo}/statuses/{sha}         (merge-gate commit status)

pub mod types;
pub use types::*;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use tracing::debug;

use crate::errors::{ConfigError, ProviderError, ReviewResult};

/// GitHub connection settings, fixed for an invocation.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Installation or PAT token.
    pub token: String,
}

impl GithubConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("GITHUB_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        let base_api = std::env::var("GITHUB_API_BASE")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        Ok(Self { base_api, token })
    }
}

/// Thin client over the endpoints the pipeline needs.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_api: String,
    token: String,
}

/// Page size for the changed-files listing.
const FILES_PER_PAGE: u32 = 100;

impl GithubClient {
    /// Constructs a client with a shared reqwest instance and auth token.
    pub fn from_config(cfg: &GithubConfig) -> ReviewResult<Self> {
        let http = Client::builder().user_agent("pr-ai/0.1").build()?;
        Ok(Self {
            http,
            base_api: cfg.base_api.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    /// Lists all changed files of the pull request, following pagination.
    pub async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> ReviewResult<Vec<PrFile>> {
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/pulls/{}/files?per_page={}&page={}",
                self.base_api, owner, repo, pull_number, FILES_PER_PAGE, page
            );
            debug!(%url, "github: list changed files page");
            let batch: Vec<PrFile> = self
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let last = (batch.len() as u32) < FILES_PER_PAGE;
            files.extend(batch);
            if last {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    /// Fetches a file's text content at a specific revision, split into lines.
    ///
    /// Returns `Ok(None)` when the file does not exist at that ref (404);
    /// the caller then reviews the file without surrounding context.
    pub async fn get_file_lines_at_revision(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
    ) -> ReviewResult<Option<Vec<String>>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.base_api,
            owner,
            repo,
            encode_path(path),
            urlencoding::encode(revision)
        );
        debug!(%url, "github: fetch file content");

        let resp = self.get(url).send().await?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let body: ContentsResponse = resp.error_for_status()?.json().await?;

        if body.encoding != "base64" {
            return Err(ProviderError::InvalidResponse(format!(
                "unexpected content encoding: {}",
                body.encoding
            ))
            .into());
        }

        // The API wraps base64 payloads with newlines.
        let packed: String = body.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad base64 content: {e}")))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        Ok(Some(text.split('\n').map(str::to_string).collect()))
    }

    /// Submits one review (inline comments, verdict, or general comment).
    pub async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        submission: &ReviewSubmission,
    ) -> ReviewResult<()> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/reviews",
            self.base_api, owner, repo, pull_number
        );
        debug!(%url, event = submission.event, comments = submission.comments.len(), "github: submit review");

        self.post(url)
            .json(submission)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Posts the merge-gate commit status for the PR head.
    pub async fn create_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CommitStatus,
    ) -> ReviewResult<()> {
        let url = format!(
            "{}/repos/{}/{}/statuses/{}",
            self.base_api,
            owner,
            repo,
            urlencoding::encode(sha)
        );
        debug!(%url, state = status.state, "github: create commit status");

        self.post(url)
            .json(status)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Percent-encodes each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_encoded_separately() {
        assert_eq!(encode_path("src/has space/a.rs"), "src/has%20space/a.rs");
        assert_eq!(encode_path("plain.rs"), "plain.rs");
    }
}
