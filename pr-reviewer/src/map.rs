//! Comment mapping.
//!
//! Converts the normalized model result into the host's comment-submission
//! shape and derives the review decision. All per-comment malformation is
//! absorbed here: bad entries are dropped with a diagnostic, never raised.
//! Mapping is a pure function of its input; mapping the same result twice
//! yields identical output.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::extract::{ModelReviewResult, ReviewVerdict};

/// A host-bound review comment: path + body + exactly one of line/position.
///
/// Serialized directly into the review-submission payload; `None` fields
/// are omitted on the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReviewComment {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub body: String,
}

impl ReviewComment {
    /// Comment anchored to an absolute line on the new-file side of the diff.
    pub fn at_line(path: &str, line: u32, body: &str) -> Self {
        Self {
            path: path.to_string(),
            line: Some(line),
            side: Some("RIGHT"),
            position: None,
            body: body.to_string(),
        }
    }

    /// Comment anchored to a position (offset within the diff itself).
    pub fn at_position(path: &str, position: u32, body: &str) -> Self {
        Self {
            path: path.to_string(),
            line: None,
            side: None,
            position: Some(position),
            body: body.to_string(),
        }
    }
}

/// Overall decision derived from the model result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    RequestChanges,
    Comment,
    GeneralFallback,
}

/// Output of the mapping stage, consumed by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedReview {
    /// Valid comments in model order (file-grouped dedup applied).
    pub comments: Vec<ReviewComment>,
    /// Decision derived per schema rules.
    pub decision: ReviewDecision,
    /// Whether the schema carries an approve/request-changes verdict that
    /// is posted as its own submission (file-grouped only).
    pub carries_verdict: bool,
    /// How many comment entries the model returned before validation.
    pub attempted: usize,
}

/// Maps a normalized model result into host comments plus a decision.
///
/// Never fails: malformed entries are dropped individually. The only
/// unmappable shapes are rejected earlier, by the extractor.
pub fn map_comments(result: &ModelReviewResult) -> MappedReview {
    match result {
        ModelReviewResult::FileGrouped { is_approved, files } => {
            let mut comments = Vec::new();
            let mut attempted = 0usize;
            let mut seen: HashSet<&str> = HashSet::new();

            for entry in files {
                let Some(file_name) = entry.file_name.as_deref() else {
                    warn!("dropping review entry without a fileName");
                    attempted += entry.comments.len();
                    continue;
                };
                // Duplicate filenames: first occurrence wins, later ones are
                // dropped whole rather than merged.
                if !seen.insert(file_name) {
                    warn!(file = %file_name, "duplicate fileName in model review; dropping");
                    attempted += entry.comments.len();
                    continue;
                }

                for c in &entry.comments {
                    attempted += 1;
                    let Some(body) = c.value.as_deref().filter(|v| !v.trim().is_empty()) else {
                        warn!(file = %file_name, "dropping comment without a body");
                        continue;
                    };
                    let position = match c.position {
                        Some(p) if p >= 1 && p <= i64::from(u32::MAX) => p as u32,
                        other => {
                            warn!(
                                file = %file_name,
                                position = ?other,
                                "dropping comment with a non-numeric or sub-1 position"
                            );
                            continue;
                        }
                    };
                    comments.push(ReviewComment::at_position(file_name, position, body));
                }
            }

            MappedReview {
                comments,
                // Verdict is independent of how many comments survived.
                decision: if *is_approved {
                    ReviewDecision::Approve
                } else {
                    ReviewDecision::RequestChanges
                },
                carries_verdict: true,
                attempted,
            }
        }

        ModelReviewResult::Legacy { decision, comments } => {
            let mut mapped = Vec::new();
            for c in comments {
                let (Some(path), Some(body)) = (c.path.as_deref(), c.comment.as_deref()) else {
                    warn!("dropping legacy comment without path or body");
                    continue;
                };
                let line = match c.line {
                    Some(l) if l >= 1 && l <= i64::from(u32::MAX) => l as u32,
                    other => {
                        warn!(path = %path, line = ?other, "dropping legacy comment with bad line");
                        continue;
                    }
                };
                mapped.push(ReviewComment::at_line(path, line, body));
            }

            MappedReview {
                comments: mapped,
                decision: match decision {
                    ReviewVerdict::Approve => ReviewDecision::Approve,
                    ReviewVerdict::RequestChanges => ReviewDecision::RequestChanges,
                    ReviewVerdict::Comment => ReviewDecision::Comment,
                },
                carries_verdict: false,
                attempted: comments.len(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{FileEntry, RawLegacyComment, RawPositionComment};

    fn grouped(files: Vec<FileEntry>, is_approved: bool) -> ModelReviewResult {
        ModelReviewResult::FileGrouped { is_approved, files }
    }

    fn entry(name: &str, comments: Vec<(Option<i64>, Option<&str>)>) -> FileEntry {
        FileEntry {
            file_name: Some(name.to_string()),
            comments: comments
                .into_iter()
                .map(|(position, value)| RawPositionComment {
                    position,
                    value: value.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn duplicate_filenames_are_dropped_whole() {
        let result = grouped(
            vec![
                entry("a.js", vec![(Some(5), Some("first"))]),
                entry("a.js", vec![(Some(9), Some("second"))]),
            ],
            false,
        );
        let mapped = map_comments(&result);
        assert_eq!(mapped.comments.len(), 1);
        assert_eq!(mapped.comments[0], ReviewComment::at_position("a.js", 5, "first"));
        assert_eq!(mapped.attempted, 2);
    }

    #[test]
    fn invalid_positions_and_empty_bodies_are_dropped() {
        let result = grouped(
            vec![entry(
                "a.js",
                vec![
                    (Some(0), Some("sub-1")),
                    (None, Some("non-numeric")),
                    (Some(3), Some("   ")),
                    (Some(4), Some("kept")),
                ],
            )],
            false,
        );
        let mapped = map_comments(&result);
        assert_eq!(mapped.comments, vec![ReviewComment::at_position("a.js", 4, "kept")]);
        assert_eq!(mapped.attempted, 4);
    }

    #[test]
    fn grouped_decision_ignores_comment_count() {
        let approved = map_comments(&grouped(vec![], true));
        assert_eq!(approved.decision, ReviewDecision::Approve);
        assert!(approved.carries_verdict);

        let rejected = map_comments(&grouped(vec![entry("a", vec![(Some(1), Some("x"))])], false));
        assert_eq!(rejected.decision, ReviewDecision::RequestChanges);
    }

    #[test]
    fn legacy_comments_anchor_to_the_right_side() {
        let result = ModelReviewResult::Legacy {
            decision: ReviewVerdict::RequestChanges,
            comments: vec![RawLegacyComment {
                path: Some("src/lib.rs".to_string()),
                line: Some(14),
                comment: Some("rename this".to_string()),
            }],
        };
        let mapped = map_comments(&result);
        assert_eq!(mapped.comments.len(), 1);
        assert_eq!(mapped.comments[0].side, Some("RIGHT"));
        assert_eq!(mapped.comments[0].line, Some(14));
        assert_eq!(mapped.comments[0].position, None);
        assert_eq!(mapped.decision, ReviewDecision::RequestChanges);
        assert!(!mapped.carries_verdict);
    }

    #[test]
    fn mapping_is_idempotent() {
        let result = grouped(
            vec![
                entry("a.js", vec![(Some(2), Some("x")), (Some(-3), None)]),
                entry("b.js", vec![(Some(7), Some("y"))]),
            ],
            true,
        );
        assert_eq!(map_comments(&result), map_comments(&result));
    }
}
