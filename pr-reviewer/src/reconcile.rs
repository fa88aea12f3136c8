//! Review reconciliation.
//!
//! Decides the final submission instructions from the extraction outcome
//! and the mapped comment count:
//! `Start → Parsed → Mapped → {InlineSubmitted | GeneralFallbackSubmitted} → Done`.
//! Extraction or mapping failure short-circuits to the fallback path with
//! the reason recorded; exactly one path is taken per invocation.
//!
//! The instructions are consumed by the external review-submission
//! collaborator. When both an inline-comments submission and a verdict
//! submission are emitted they are two independent calls, and either may
//! fail without rolling back the other.

use tracing::{debug, warn};

use crate::errors::ExtractError;
use crate::extract::ModelReviewResult;
use crate::map::{MappedReview, ReviewComment, ReviewDecision, map_comments};

/// Review event names as the host expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    Comment,
}

impl ReviewEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewEvent::Approve => "APPROVE",
            ReviewEvent::RequestChanges => "REQUEST_CHANGES",
            ReviewEvent::Comment => "COMMENT",
        }
    }
}

/// One instruction for the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// All inline comments attached to a single review.
    InlineReview {
        event: ReviewEvent,
        comments: Vec<ReviewComment>,
    },
    /// Separate approve/request-changes verdict call (file-grouped schema).
    Verdict {
        event: ReviewEvent,
        body: Option<String>,
    },
    /// Single non-inline comment (positive no-issues note or fallback).
    GeneralComment { body: String },
}

/// Final reconciliation product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub submissions: Vec<Submission>,
    pub decision: ReviewDecision,
    /// Recorded only on the fallback path.
    pub reason: Option<&'static str>,
}

/// Fallback bodies are capped to stay inside host limits.
const MAX_FALLBACK_CHARS: usize = 65_000;

const NO_ISSUES_MESSAGE: &str = "Automated review: no actionable issues found.";
const NO_VALID_COMMENTS_MESSAGE: &str =
    "Automated review: no valid inline comments could be generated.";
const REQUEST_CHANGES_BODY: &str = "Automated review: changes requested.";

const REASON_PARSE_FAILED: &str = "JSON parsing failed";
const REASON_NO_VALID_COMMENTS: &str = "No valid comments generated";

/// Reconciles the extraction outcome into submission instructions.
///
/// `raw` is the unparsed model output, used verbatim (truncated) when the
/// whole extraction failed.
pub fn reconcile(
    extraction: Result<ModelReviewResult, ExtractError>,
    raw: &str,
) -> ReconcileReport {
    let result = match extraction {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "model response unparseable; posting general fallback comment");
            return ReconcileReport {
                submissions: vec![Submission::GeneralComment {
                    body: truncate_chars(raw, MAX_FALLBACK_CHARS),
                }],
                decision: ReviewDecision::GeneralFallback,
                reason: Some(REASON_PARSE_FAILED),
            };
        }
    };

    let mapped = map_comments(&result);
    debug!(
        comments = mapped.comments.len(),
        attempted = mapped.attempted,
        carries_verdict = mapped.carries_verdict,
        "reconcile: mapped model result"
    );

    if !mapped.comments.is_empty() {
        return inline_path(mapped);
    }

    if mapped.attempted > 0 {
        // The model produced comment entries but none survived validation.
        warn!(
            attempted = mapped.attempted,
            "all model comments were malformed; posting general fallback comment"
        );
        let mut submissions = vec![Submission::GeneralComment {
            body: NO_VALID_COMMENTS_MESSAGE.to_string(),
        }];
        if mapped.carries_verdict {
            submissions.push(verdict_submission(mapped.decision));
        }
        return ReconcileReport {
            submissions,
            decision: ReviewDecision::GeneralFallback,
            reason: Some(REASON_NO_VALID_COMMENTS),
        };
    }

    // Genuinely zero comments. A schema-supplied verdict is the review
    // artifact on its own; without one, post the positive note.
    if mapped.carries_verdict {
        ReconcileReport {
            submissions: vec![verdict_submission(mapped.decision)],
            decision: mapped.decision,
            reason: None,
        }
    } else {
        ReconcileReport {
            submissions: vec![Submission::GeneralComment {
                body: NO_ISSUES_MESSAGE.to_string(),
            }],
            decision: ReviewDecision::Comment,
            reason: None,
        }
    }
}

fn inline_path(mapped: MappedReview) -> ReconcileReport {
    let decision = mapped.decision;
    let inline_event = if mapped.carries_verdict {
        // Verdict travels in its own call; inline comments ride a plain
        // COMMENT review.
        ReviewEvent::Comment
    } else {
        decision_event(decision)
    };

    let mut submissions = vec![Submission::InlineReview {
        event: inline_event,
        comments: mapped.comments,
    }];
    if mapped.carries_verdict {
        submissions.push(verdict_submission(decision));
    }

    ReconcileReport {
        submissions,
        decision,
        reason: None,
    }
}

fn verdict_submission(decision: ReviewDecision) -> Submission {
    let event = decision_event(decision);
    Submission::Verdict {
        event,
        body: match event {
            // The host requires a body when requesting changes.
            ReviewEvent::RequestChanges => Some(REQUEST_CHANGES_BODY.to_string()),
            _ => None,
        },
    }
}

fn decision_event(decision: ReviewDecision) -> ReviewEvent {
    match decision {
        ReviewDecision::Approve => ReviewEvent::Approve,
        ReviewDecision::RequestChanges => ReviewEvent::RequestChanges,
        ReviewDecision::Comment | ReviewDecision::GeneralFallback => ReviewEvent::Comment,
    }
}

/// Character-boundary-safe prefix truncation.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_review;

    #[test]
    fn legacy_approve_with_no_comments_posts_only_the_positive_note() {
        let raw = "```json\n{\"decision\":\"APPROVE\",\"comments\":[]}\n```";
        let report = reconcile(extract_review(raw), raw);
        assert_eq!(
            report.submissions,
            vec![Submission::GeneralComment {
                body: NO_ISSUES_MESSAGE.to_string(),
            }]
        );
        assert_eq!(report.decision, ReviewDecision::Comment);
        assert_eq!(report.reason, None);
    }

    #[test]
    fn grouped_approve_with_empty_review_posts_only_the_verdict() {
        let raw = r#"{"review":[],"isApproved":true}"#;
        let report = reconcile(extract_review(raw), raw);
        assert_eq!(
            report.submissions,
            vec![Submission::Verdict {
                event: ReviewEvent::Approve,
                body: None,
            }]
        );
        assert_eq!(report.decision, ReviewDecision::Approve);
    }

    #[test]
    fn grouped_comments_emit_inline_review_plus_verdict() {
        let raw = "Here is my review:\n{\"review\":[{\"fileName\":\"a.js\",\"comments\":[{\"absolutePosition\":5,\"value\":\"fix this\"}]}],\"isApproved\":false}\nThanks!";
        let report = reconcile(extract_review(raw), raw);
        assert_eq!(report.submissions.len(), 2);
        let Submission::InlineReview { event, comments } = &report.submissions[0] else {
            panic!("expected inline review first");
        };
        assert_eq!(*event, ReviewEvent::Comment);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0], ReviewComment::at_position("a.js", 5, "fix this"));
        assert_eq!(
            report.submissions[1],
            Submission::Verdict {
                event: ReviewEvent::RequestChanges,
                body: Some(REQUEST_CHANGES_BODY.to_string()),
            }
        );
        assert_eq!(report.decision, ReviewDecision::RequestChanges);
    }

    #[test]
    fn legacy_comments_ride_a_single_review_with_the_decision_event() {
        let raw = r#"{"decision":"REQUEST_CHANGES","comments":[{"path":"a.rs","line":3,"comment":"fix"}]}"#;
        let report = reconcile(extract_review(raw), raw);
        assert_eq!(report.submissions.len(), 1);
        let Submission::InlineReview { event, .. } = &report.submissions[0] else {
            panic!("expected inline review");
        };
        assert_eq!(*event, ReviewEvent::RequestChanges);
    }

    #[test]
    fn unparseable_prose_falls_back_to_a_truncated_general_comment() {
        let raw = "no json here ".repeat(10_000);
        let report = reconcile(extract_review(&raw), &raw);
        assert_eq!(report.reason, Some(REASON_PARSE_FAILED));
        assert_eq!(report.decision, ReviewDecision::GeneralFallback);
        let [Submission::GeneralComment { body }] = report.submissions.as_slice() else {
            panic!("expected single general comment");
        };
        assert_eq!(body.chars().count(), MAX_FALLBACK_CHARS);
        assert!(raw.starts_with(body.as_str()));
    }

    #[test]
    fn all_malformed_comments_record_the_no_valid_comments_reason() {
        let raw = r#"{"review":[{"fileName":"a.js","comments":[{"absolutePosition":0,"value":"x"}]}],"isApproved":false}"#;
        let report = reconcile(extract_review(raw), raw);
        assert_eq!(report.reason, Some(REASON_NO_VALID_COMMENTS));
        assert_eq!(report.decision, ReviewDecision::GeneralFallback);
        // Verdict still posts alongside the fallback note.
        assert!(matches!(
            report.submissions.as_slice(),
            [
                Submission::GeneralComment { .. },
                Submission::Verdict {
                    event: ReviewEvent::RequestChanges,
                    ..
                }
            ]
        ));
    }
}
