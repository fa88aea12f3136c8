use serde::Deserialize;

/// GitHub `pull_request` webhook payload, reduced to the fields the
/// pipeline consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequestInfo,
    pub repository: RepositoryInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub head: HeadRef,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub owner: OwnerInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerInfo {
    pub login: String,
}
