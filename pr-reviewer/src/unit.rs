//! Review unit assembly.
//!
//! Groups the context windows of one file into a `ReviewUnit`, the atomic
//! piece of evidence sent to the model. Files without a patch (binary or
//! too large) and files whose extraction produced no windows yield no unit.

use serde::Serialize;

use crate::context::{ContextWindow, build_window};
use crate::diff::ChangedLine;
use crate::github::types::PrFile;

/// Per-file bundle of changed-line context.
///
/// Invariant: never constructed with an empty `hunks` sequence.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReviewUnit {
    /// Repo-relative path of the file.
    pub file: String,
    /// Lowercase extension without the leading dot, or the whole filename
    /// when there is none. A plain split, not a language table.
    pub language: String,
    /// Windows in diff order, one per changed line.
    pub hunks: Vec<ContextWindow>,
}

/// Assembles one file's unit, or `None` when there is nothing to review.
pub fn assemble_unit(
    file: &PrFile,
    changed_lines: &[ChangedLine],
    file_lines: &[String],
) -> Option<ReviewUnit> {
    file.patch.as_ref()?;

    let hunks: Vec<ContextWindow> = changed_lines
        .iter()
        .map(|ch| build_window(&file.filename, file_lines, ch))
        .collect();

    if hunks.is_empty() {
        return None;
    }

    Some(ReviewUnit {
        file: file.filename.clone(),
        language: language_of(&file.filename),
        hunks,
    })
}

/// Substring after the last `.`, lowercased; the full name if no dot.
fn language_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr_file(name: &str, patch: Option<&str>) -> PrFile {
        PrFile {
            filename: name.to_string(),
            status: "modified".to_string(),
            additions: 1,
            deletions: 0,
            patch: patch.map(str::to_string),
        }
    }

    fn one_change() -> Vec<ChangedLine> {
        vec![ChangedLine {
            line: 1,
            content: "x".to_string(),
        }]
    }

    #[test]
    fn file_without_patch_yields_no_unit() {
        let unit = assemble_unit(&pr_file("big.bin", None), &one_change(), &[]);
        assert!(unit.is_none());
    }

    #[test]
    fn zero_changed_lines_yield_no_unit() {
        let unit = assemble_unit(&pr_file("a.rs", Some("@@ -1 +1 @@")), &[], &[]);
        assert!(unit.is_none());
    }

    #[test]
    fn language_is_the_lowercased_extension() {
        let lines = vec!["x".to_string()];
        let unit = assemble_unit(&pr_file("src/Main.TSX", Some("p")), &one_change(), &lines)
            .unwrap();
        assert_eq!(unit.language, "tsx");
        assert_eq!(unit.hunks.len(), 1);
    }

    #[test]
    fn dotless_filename_is_used_whole() {
        let unit = assemble_unit(&pr_file("Makefile", Some("p")), &one_change(), &[]).unwrap();
        assert_eq!(unit.language, "makefile");
    }

    #[test]
    fn nested_dots_take_the_last_segment() {
        let unit = assemble_unit(&pr_file("a.test.js", Some("p")), &one_change(), &[]).unwrap();
        assert_eq!(unit.language, "js");
    }
}
