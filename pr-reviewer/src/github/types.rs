//! Wire types for the GitHub REST client.
//!
//! Only the fields this pipeline consumes are modeled; everything else in
//! the provider payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::map::ReviewComment;
use crate::reconcile::ReviewEvent;

/// One changed file of a pull request, from `GET /pulls/{n}/files`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PrFile {
    pub filename: String,
    pub status: String,
    pub additions: u32,
    pub deletions: u32,
    /// Unified diff for the file. Absent for binary or oversized files —
    /// absence is the "skip this file" signal.
    #[serde(default)]
    pub patch: Option<String>,
}

/// Payload of `GET /repos/{o}/{r}/contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    /// Base64 text, possibly wrapped with newlines by the API.
    pub content: String,
    pub encoding: String,
}

/// Body of `POST /pulls/{n}/reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSubmission {
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<ReviewComment>,
}

impl ReviewSubmission {
    pub fn inline(event: ReviewEvent, comments: Vec<ReviewComment>) -> Self {
        Self {
            event: event.as_str(),
            body: None,
            comments,
        }
    }

    pub fn general(event: ReviewEvent, body: Option<String>) -> Self {
        Self {
            event: event.as_str(),
            body,
            comments: Vec::new(),
        }
    }
}

/// Commit status state for the merge gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitState::Success => "success",
            CommitState::Failure => "failure",
        }
    }
}

/// Body of `POST /repos/{o}/{r}/statuses/{sha}`.
#[derive(Debug, Clone, Serialize)]
pub struct CommitStatus {
    pub state: &'static str,
    pub context: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}
