//! Context window builder.
//!
//! Cuts a small, bounded window of destination-file content around each
//! changed line. The window spans five lines above and five below the
//! changed line, clamped at file boundaries; the `-6` lower bound is the
//! 1-based/0-based offset of the changed line itself. The exact span is
//! load-bearing for output stability, so keep it byte-for-byte.

use serde::Serialize;

use crate::diff::ChangedLine;

/// Windowed evidence for one changed line, serialized into the prompt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContextWindow {
    /// Repo-relative path of the file.
    pub file: String,
    /// 1-based destination line number of the change.
    pub line: u32,
    /// The added line text (marker stripped).
    pub changed: String,
    /// Surrounding lines joined with `\n` (changed line included).
    pub context: String,
}

/// Builds the clamped window for one changed line.
///
/// `file_lines` is the full file content at the head revision, split into
/// lines (0-based storage, 1-based addressing). Inputs are in-bounds by
/// construction; an empty file yields an empty window.
pub fn build_window(file: &str, file_lines: &[String], changed: &ChangedLine) -> ContextWindow {
    let line = changed.line as usize;
    let start = line.saturating_sub(6);
    let end = (line + 5).min(file_lines.len());

    let context = if start < end {
        file_lines[start..end].join("\n")
    } else {
        String::new()
    };

    ContextWindow {
        file: file.to_string(),
        line: changed.line,
        changed: changed.content.clone(),
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("l{i}")).collect()
    }

    fn ch(line: u32) -> ChangedLine {
        ChangedLine {
            line,
            content: format!("l{line}"),
        }
    }

    #[test]
    fn first_line_has_no_leading_context() {
        let w = build_window("a.rs", &lines(20), &ch(1));
        // slice [0, 6): the changed line plus five trailing lines.
        assert_eq!(w.context, "l1\nl2\nl3\nl4\nl5\nl6");
    }

    #[test]
    fn last_line_has_no_trailing_context() {
        let w = build_window("a.rs", &lines(20), &ch(20));
        // slice [14, 20): five leading lines plus the changed line.
        assert_eq!(w.context, "l15\nl16\nl17\nl18\nl19\nl20");
    }

    #[test]
    fn interior_line_spans_six_above_five_below() {
        let w = build_window("a.rs", &lines(30), &ch(12));
        // slice [6, 17): lines 7..=17 of the file.
        assert_eq!(
            w.context,
            "l7\nl8\nl9\nl10\nl11\nl12\nl13\nl14\nl15\nl16\nl17"
        );
    }

    #[test]
    fn empty_file_yields_empty_window() {
        let w = build_window("a.rs", &[], &ch(3));
        assert_eq!(w.context, "");
    }
}
