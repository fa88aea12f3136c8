//! Prompt composition.
//!
//! Serializes repository identity, rubric text and review units into the
//! literal JSON document sent as the model's user message. Key casing of
//! the wire format (`RUBRIC`, `COMMENT_TEMPLATE`) is part of the prompt
//! contract and must not drift.

use serde::Serialize;

use crate::errors::ReviewResult;
use crate::unit::ReviewUnit;

/// The full model input payload for one pull-request review.
#[derive(Debug, Serialize)]
pub struct ReviewContext<'a> {
    /// `<owner>/<name>`.
    pub repo: String,
    /// Units in original file order.
    pub files: &'a [ReviewUnit],
    #[serde(rename = "RUBRIC")]
    pub rubric: &'a str,
    #[serde(rename = "COMMENT_TEMPLATE", skip_serializing_if = "Option::is_none")]
    pub comment_template: Option<&'a str>,
}

/// Renders the user message: the review context pretty-printed as JSON.
pub fn compose_user_prompt(
    owner: &str,
    repo: &str,
    units: &[ReviewUnit],
    rubric: &str,
    comment_template: Option<&str>,
) -> ReviewResult<String> {
    let ctx = ReviewContext {
        repo: format!("{owner}/{repo}"),
        files: units,
        rubric,
        comment_template,
    };
    Ok(serde_json::to_string_pretty(&ctx)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_keys_match_the_prompt_contract() {
        let prompt = compose_user_prompt("octo", "demo", &[], "be kind", Some("tmpl")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(v["repo"], "octo/demo");
        assert_eq!(v["RUBRIC"], "be kind");
        assert_eq!(v["COMMENT_TEMPLATE"], "tmpl");
        assert!(v["files"].as_array().unwrap().is_empty());
    }

    #[test]
    fn absent_template_is_omitted_entirely() {
        let prompt = compose_user_prompt("octo", "demo", &[], "r", None).unwrap();
        let v: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert!(v.get("COMMENT_TEMPLATE").is_none());
    }
}
