use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use tracing::{error, info};

use pr_reviewer::{ReviewRequest, run_review};

use crate::core::app_state::AppState;
use crate::routes::webhook::webhook_request::PullRequestEvent;

/// PR actions worth reviewing; everything else is acknowledged and dropped.
const ACTIONABLE: &[&str] = &["opened", "synchronize", "reopened"];

/// POST /webhook
///
/// GitHub webhook receiver. Acknowledges immediately and runs the review
/// pipeline in the background; a slow model call must not hold the hook
/// delivery open.
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    let event = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if event != "pull_request" {
        return StatusCode::OK;
    }

    let parsed: PullRequestEvent = match serde_json::from_value(payload) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "malformed pull_request payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    if !ACTIONABLE.contains(&parsed.action.as_str()) {
        info!(action = %parsed.action, "skipping pull request action");
        return StatusCode::OK;
    }

    let req = ReviewRequest {
        owner: parsed.repository.owner.login,
        repo: parsed.repository.name,
        pull_number: parsed.pull_request.number,
        head_sha: parsed.pull_request.head.sha,
        html_url: parsed.pull_request.html_url,
    };

    info!(
        "processing pull request {}/{}#{} ({})",
        req.owner, req.repo, req.pull_number, parsed.action
    );

    let state = Arc::clone(&state);
    tokio::spawn(async move {
        match run_review(&state.review_config, &req).await {
            Ok(outcome) => info!(?outcome, "review finished"),
            Err(e) => error!(error = %e, "review invocation failed"),
        }
    });

    StatusCode::ACCEPTED
}
