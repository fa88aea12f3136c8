//! Model response extraction.
//!
//! Language models wrap JSON in prose or markdown fences, or truncate it.
//! This module recovers a structured review from the raw text blob via a
//! fixed recovery ladder and normalizes it into one tagged union right
//! away, so downstream stages never branch on wire shape again.
//!
//! Ladder (first success wins, each stage a plain success/failure value):
//! 1. strip a leading/trailing code fence when present;
//! 2. direct JSON parse;
//! 3. bracket-scanning extraction of the first balanced `{...}`/`[...]`
//!    block, honoring string literals and escapes;
//! 4. fail with the original raw text kept for diagnostics.
//!
//! The ladder repairs syntactic wrapping only. It never guesses semantic
//! content; unbalanced (truncated) JSON falls through to the error path.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::errors::ExtractError;

/// Review verdict as stated by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approve,
    RequestChanges,
    Comment,
}

/// Legacy-schema comment entry, fields kept lenient for the mapper to vet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLegacyComment {
    pub path: Option<String>,
    pub line: Option<i64>,
    pub comment: Option<String>,
}

/// File-grouped-schema comment entry, fields kept lenient likewise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPositionComment {
    /// `absolutePosition` as an integer; string digits are accepted.
    pub position: Option<i64>,
    pub value: Option<String>,
}

/// One per-file group of the file-grouped schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file_name: Option<String>,
    pub comments: Vec<RawPositionComment>,
}

/// Normalized model output, discriminated by wire shape:
/// a `review` array marks the file-grouped schema, a `decision`/`comments`
/// pair marks the legacy one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReviewResult {
    Legacy {
        decision: ReviewVerdict,
        comments: Vec<RawLegacyComment>,
    },
    FileGrouped {
        is_approved: bool,
        files: Vec<FileEntry>,
    },
}

/// Recovers a structured review result from raw model output.
///
/// Fails with [`ExtractError`] only after the whole ladder is exhausted or
/// when the recovered JSON matches neither review schema.
pub fn extract_review(raw: &str) -> Result<ModelReviewResult, ExtractError> {
    if raw.trim().is_empty() {
        return Err(ExtractError::EmptyResponse);
    }

    let stripped = strip_code_fences(raw);
    let value = parse_attempts(stripped).ok_or_else(|| ExtractError::NoJsonFound {
        raw: raw.to_string(),
    })?;

    normalize(value)
}

lazy_static! {
    static ref FENCE_OPEN: Regex = Regex::new(r"^```[A-Za-z0-9_-]*\s*").unwrap();
    static ref FENCE_CLOSE: Regex = Regex::new(r"\s*```$").unwrap();
}

/// Removes an enclosing markdown code fence (optionally language-tagged).
/// Text that does not open with a fence is returned trimmed, untouched.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let mut s = trimmed;
    if let Some(m) = FENCE_OPEN.find(s) {
        s = &s[m.end()..];
    }
    if let Some(m) = FENCE_CLOSE.find(s) {
        s = &s[..m.start()];
    }
    s.trim()
}

/// Parse attempts in ladder order; `None` means every stage failed.
fn parse_attempts(src: &str) -> Option<Value> {
    serde_json::from_str::<Value>(src).ok().or_else(|| {
        extract_first_json_block(src).and_then(|block| serde_json::from_str(block).ok())
    })
}

/// Finds the first balanced JSON object/array substring.
///
/// Scans from the first `{` or `[`, tracking nesting depth of that bracket
/// kind only, with string literals and escape sequences honored so braces
/// inside strings never count.
fn extract_first_json_block(src: &str) -> Option<&str> {
    let start = src.find(['{', '['])?;
    let bytes = src.as_bytes();
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(&src[start..=i]);
            }
        }
    }

    None
}

/// Normalizes a parsed JSON value into [`ModelReviewResult`].
fn normalize(value: Value) -> Result<ModelReviewResult, ExtractError> {
    let obj = match value {
        Value::Object(map) => map,
        Value::Array(_) => {
            return Err(ExtractError::InvalidShape(
                "top-level JSON array matches no review schema".into(),
            ));
        }
        other => {
            return Err(ExtractError::InvalidShape(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    if obj.contains_key("review") || obj.contains_key("isApproved") {
        return normalize_file_grouped(&obj);
    }
    if obj.contains_key("decision") || obj.contains_key("comments") {
        return normalize_legacy(&obj);
    }

    Err(ExtractError::InvalidShape(
        "object has neither a `review` array nor a `decision`/`comments` pair".into(),
    ))
}

fn normalize_file_grouped(
    obj: &serde_json::Map<String, Value>,
) -> Result<ModelReviewResult, ExtractError> {
    let review = obj
        .get("review")
        .ok_or(ExtractError::MissingField("review"))?
        .as_array()
        .ok_or(ExtractError::MissingField("review"))?;

    let is_approved = match obj.get("isApproved").and_then(Value::as_bool) {
        Some(b) => b,
        None => {
            warn!("model response lacks a boolean `isApproved`; treating as not approved");
            false
        }
    };

    let files = review
        .iter()
        .map(|entry| FileEntry {
            file_name: entry
                .get("fileName")
                .and_then(Value::as_str)
                .map(str::to_string),
            comments: entry
                .get("comments")
                .and_then(Value::as_array)
                .map(|cs| cs.iter().map(raw_position_comment).collect())
                .unwrap_or_default(),
        })
        .collect();

    Ok(ModelReviewResult::FileGrouped { is_approved, files })
}

fn normalize_legacy(
    obj: &serde_json::Map<String, Value>,
) -> Result<ModelReviewResult, ExtractError> {
    let decision = match obj.get("decision").and_then(Value::as_str) {
        Some("APPROVE") => ReviewVerdict::Approve,
        Some("REQUEST_CHANGES") => ReviewVerdict::RequestChanges,
        Some("COMMENT") => ReviewVerdict::Comment,
        other => {
            warn!(decision = ?other, "missing or unknown `decision`; defaulting to COMMENT");
            ReviewVerdict::Comment
        }
    };

    let comments = obj
        .get("comments")
        .and_then(Value::as_array)
        .map(|cs| {
            cs.iter()
                .map(|c| RawLegacyComment {
                    path: c.get("path").and_then(Value::as_str).map(str::to_string),
                    line: integer_of(c.get("line")),
                    comment: c
                        .get("comment")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ModelReviewResult::Legacy { decision, comments })
}

fn raw_position_comment(c: &Value) -> RawPositionComment {
    RawPositionComment {
        position: integer_of(c.get("absolutePosition")),
        value: c.get("value").and_then(Value::as_str).map(str::to_string),
    }
}

/// Integer coercion: JSON numbers directly, digit strings leniently.
fn integer_of(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"{"decision":"APPROVE","comments":[]}"#;

    #[test]
    fn fenced_and_bare_inputs_extract_identically() {
        let fenced = format!("```json\n{LEGACY}\n```");
        assert_eq!(
            extract_review(&fenced).unwrap(),
            extract_review(LEGACY).unwrap()
        );
    }

    #[test]
    fn legacy_schema_is_normalized() {
        let got = extract_review(LEGACY).unwrap();
        assert_eq!(
            got,
            ModelReviewResult::Legacy {
                decision: ReviewVerdict::Approve,
                comments: vec![],
            }
        );
    }

    #[test]
    fn prose_wrapped_file_grouped_object_is_recovered() {
        let raw = "Here is my review:\n{\"review\":[{\"fileName\":\"a.js\",\"comments\":[{\"absolutePosition\":5,\"value\":\"fix this\"}]}],\"isApproved\":false}\nThanks!";
        let got = extract_review(raw).unwrap();
        let ModelReviewResult::FileGrouped { is_approved, files } = got else {
            panic!("expected file-grouped result");
        };
        assert!(!is_approved);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name.as_deref(), Some("a.js"));
        assert_eq!(files[0].comments[0].position, Some(5));
        assert_eq!(files[0].comments[0].value.as_deref(), Some("fix this"));
    }

    #[test]
    fn braces_inside_string_literals_do_not_confuse_the_scanner() {
        let raw = r#"note {"decision":"COMMENT","comments":[{"path":"a{b}.js","line":3,"comment":"say \"hi\" {}"}]} trailing"#;
        let got = extract_review(raw).unwrap();
        let ModelReviewResult::Legacy { comments, .. } = got else {
            panic!("expected legacy result");
        };
        assert_eq!(comments[0].path.as_deref(), Some("a{b}.js"));
    }

    #[test]
    fn empty_input_is_its_own_error() {
        assert!(matches!(
            extract_review("   \n\t"),
            Err(ExtractError::EmptyResponse)
        ));
    }

    #[test]
    fn plain_prose_fails_with_the_raw_text_attached() {
        let raw = "I could not produce a structured review, sorry.";
        match extract_review(raw) {
            Err(ExtractError::NoJsonFound { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected NoJsonFound, got {other:?}"),
        }
    }

    #[test]
    fn truncated_json_is_not_repaired() {
        let raw = r#"{"review":[{"fileName":"a.js","comments":[{"absolutePosition":5"#;
        assert!(matches!(
            extract_review(raw),
            Err(ExtractError::NoJsonFound { .. })
        ));
    }

    #[test]
    fn non_array_review_field_names_the_field() {
        let raw = r#"{"review":"oops","isApproved":true}"#;
        assert!(matches!(
            extract_review(raw),
            Err(ExtractError::MissingField("review"))
        ));
    }

    #[test]
    fn missing_is_approved_defaults_to_not_approved() {
        let raw = r#"{"review":[]}"#;
        let got = extract_review(raw).unwrap();
        assert_eq!(
            got,
            ModelReviewResult::FileGrouped {
                is_approved: false,
                files: vec![],
            }
        );
    }

    #[test]
    fn string_positions_are_coerced_leniently() {
        let raw = r#"{"review":[{"fileName":"b.rs","comments":[{"absolutePosition":"7","value":"v"}]}],"isApproved":true}"#;
        let ModelReviewResult::FileGrouped { files, .. } = extract_review(raw).unwrap() else {
            panic!();
        };
        assert_eq!(files[0].comments[0].position, Some(7));
    }
}
