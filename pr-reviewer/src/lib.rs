//! Public entry for the pr-reviewer pipeline.
//!
//! Single high-level function to run the whole pipeline for a pull request.
//!
//! 1) **Step 1 — Changed files**
//!    - List the PR's changed files (paginated)
//!    - Apply the text-extension allowlist and operator globs
//!
//! 2) **Step 2 — Review units (per file, order-preserving)**
//!    - Parse the file's unified diff into added-line records
//!    - Fetch the file content at the PR head revision
//!    - Cut a clamped context window per changed line, bundle into a unit
//!    - Any per-file failure (bad patch, missing content) skips that file
//!      only; the rest of the PR is still reviewed
//!
//! 3) **Step 3 — Model call**
//!    - Serialize repo id, rubric and units into the user message
//!    - One inference call against the configured provider
//!
//! 4) **Step 4 — Extraction, mapping, reconciliation**
//!    - Recover a structured result from the raw text (recovery ladder)
//!    - Map it into host comments, derive the decision
//!    - Reconcile into submission instructions with fallback behavior
//!
//! 5) **Step 5 — Submission**
//!    - Post the merge-gate commit status, then each review submission;
//!      the submissions are independent calls and may fail independently
//!
//! The pipeline uses `tracing` for debug logging and avoids `async-trait`
//! and heap trait objects (no `Box<dyn ...>`). It relies on plain
//! `async fn` and enum-dispatch over thin provider/LLM clients.

pub mod config;
pub mod context;
pub mod diff;
pub mod errors;
pub mod extract;
pub mod filter;
pub mod github;
pub mod llm;
pub mod map;
pub mod prompt;
pub mod reconcile;
pub mod unit;

use std::time::Instant;
use tracing::{debug, info, warn};

use config::ReviewConfig;
use errors::ReviewResult;
use github::{CommitState, CommitStatus, GithubClient, ReviewSubmission};
use llm::LlmClient;
use map::ReviewDecision;
use reconcile::{Submission, reconcile};
use unit::ReviewUnit;

/// Guardrail on the serialized diff payload sent to the model.
const DIFF_LIMIT_CHARS: usize = 120_000;

/// Identity of one pull-request review invocation.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
    /// PR head SHA; file content and the commit status bind to it.
    pub head_sha: String,
    /// PR web URL, attached to the commit status when present.
    pub html_url: Option<String>,
}

/// What a finished invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Nothing reviewable (no textual diffs survived selection).
    Skipped { files_changed: usize },
    /// Review artifacts were posted.
    Submitted {
        decision: ReviewDecision,
        /// Fallback reason, when the fallback path was taken.
        reason: Option<&'static str>,
        files_reviewed: usize,
        comments_posted: usize,
    },
}

/// Run the whole pipeline for a single pull request.
///
/// Per-file problems degrade the review (that file is skipped); a failed
/// model call or a failed submission call is terminal for the invocation.
pub async fn run_review(cfg: &ReviewConfig, req: &ReviewRequest) -> ReviewResult<ReviewOutcome> {
    let t0 = Instant::now();
    debug!("step1: init github client");
    let client = GithubClient::from_config(&cfg.github)?;

    debug!(
        "step1: list changed files for {}/{}#{}",
        req.owner, req.repo, req.pull_number
    );
    let files = client
        .list_changed_files(&req.owner, &req.repo, req.pull_number)
        .await?;
    let selected = filter::select_files(&files, &cfg.file_globs);
    debug!(
        "step1: files={} selected={} ({} ms)",
        files.len(),
        selected.len(),
        t0.elapsed().as_millis()
    );

    // ------------------------------------------
    // Step 2: review units (per file, in order)
    // ------------------------------------------
    let t2 = Instant::now();
    let units = build_units(&client, req, &selected).await?;
    debug!(
        "step2: units built, count={} ({} ms)",
        units.len(),
        t2.elapsed().as_millis()
    );

    if units.is_empty() {
        info!("no textual diffs to review; skipping invocation");
        return Ok(ReviewOutcome::Skipped {
            files_changed: files.len(),
        });
    }

    // -----------------------
    // Step 3: one model call
    // -----------------------
    let user_prompt = prompt::compose_user_prompt(
        &req.owner,
        &req.repo,
        &units,
        &cfg.rubric,
        cfg.comment_template.as_deref(),
    )?;

    let t3 = Instant::now();
    debug!(
        "step3: model call provider={:?} model={}",
        cfg.llm.kind, cfg.llm.model
    );
    let llm_client = LlmClient::from_config(&cfg.llm)?;
    let raw = llm_client
        .complete(
            &cfg.system_prompt,
            &user_prompt,
            cfg.llm.max_tokens,
            cfg.llm.temperature,
        )
        .await?;
    debug!(
        "step3: model returned {} chars ({} ms)",
        raw.chars().count(),
        t3.elapsed().as_millis()
    );

    // --------------------------------------------
    // Step 4: extract → map → reconcile (no I/O)
    // --------------------------------------------
    let report = reconcile(extract::extract_review(&raw), &raw);
    debug!(
        "step4: decision={:?} submissions={} reason={:?}",
        report.decision,
        report.submissions.len(),
        report.reason
    );

    // ----------------------------------------------------
    // Step 5: commit status + independent submission calls
    // ----------------------------------------------------
    let t5 = Instant::now();
    let approved = report.decision == ReviewDecision::Approve;
    client
        .create_commit_status(
            &req.owner,
            &req.repo,
            &req.head_sha,
            &CommitStatus {
                state: if approved {
                    CommitState::Success
                } else {
                    CommitState::Failure
                }
                .as_str(),
                context: "ai-pr-review",
                description: if approved {
                    "AI review passed".to_string()
                } else {
                    "AI review requested changes".to_string()
                },
                target_url: req.html_url.clone(),
            },
        )
        .await?;

    let mut comments_posted = 0usize;
    for submission in &report.submissions {
        let payload = match submission {
            Submission::InlineReview { event, comments } => {
                comments_posted += comments.len();
                ReviewSubmission::inline(*event, comments.clone())
            }
            Submission::Verdict { event, body } => ReviewSubmission::general(*event, body.clone()),
            Submission::GeneralComment { body } => ReviewSubmission::general(
                reconcile::ReviewEvent::Comment,
                Some(body.clone()),
            ),
        };
        client
            .submit_review(&req.owner, &req.repo, req.pull_number, &payload)
            .await?;
        info!(event = payload.event, "review submission posted");
    }
    debug!("step5: submissions done ({} ms)", t5.elapsed().as_millis());

    info!(
        "review done files={} comments={} decision={:?} in {} ms",
        units.len(),
        comments_posted,
        report.decision,
        t0.elapsed().as_millis()
    );

    Ok(ReviewOutcome::Submitted {
        decision: report.decision,
        reason: report.reason,
        files_reviewed: units.len(),
        comments_posted,
    })
}

/// Builds review units file by file, preserving original file order.
///
/// Each file's sub-pipeline is independent: a malformed patch or a failed
/// content fetch skips that file with a diagnostic. A serialized-size
/// budget bounds the total payload; files past the budget are skipped.
async fn build_units(
    client: &GithubClient,
    req: &ReviewRequest,
    selected: &[&github::PrFile],
) -> ReviewResult<Vec<ReviewUnit>> {
    let mut units = Vec::new();
    let mut budget = DIFF_LIMIT_CHARS;

    for file in selected {
        let Some(patch) = file.patch.as_deref() else {
            debug!(file = %file.filename, "no patch (binary or too large); skipping");
            continue;
        };

        let changed = match diff::parse_changed_lines(patch) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(file = %file.filename, error = %e, "unparseable patch; skipping file");
                continue;
            }
        };
        if changed.is_empty() {
            debug!(file = %file.filename, "no added lines; skipping");
            continue;
        }

        let file_lines = match client
            .get_file_lines_at_revision(&req.owner, &req.repo, &file.filename, &req.head_sha)
            .await
        {
            Ok(Some(lines)) => lines,
            Ok(None) => {
                warn!(file = %file.filename, "file missing at head revision; skipping");
                continue;
            }
            Err(e) => {
                // No context available; degrade by skipping this file only.
                warn!(file = %file.filename, error = %e, "content fetch failed; skipping file");
                continue;
            }
        };

        let Some(unit) = unit::assemble_unit(file, &changed, &file_lines) else {
            continue;
        };

        let cost = serde_json::to_string(&unit)?.len();
        if cost > budget {
            warn!(
                file = %file.filename,
                cost,
                remaining = budget,
                "diff budget exhausted; skipping file"
            );
            continue;
        }
        budget -= cost;
        units.push(unit);
    }

    Ok(units)
}

// -----------------------------------------------------------------------------
// Convenience re-exports for downstream users
// -----------------------------------------------------------------------------

pub use config::ReviewConfig as ReviewerConfig;
pub use map::ReviewDecision as ReviewerDecision;
