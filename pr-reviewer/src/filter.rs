//! File selection for review.
//!
//! Two gates run before unit assembly: a text-extension allowlist (binary
//! and exotic formats produce no useful review) and the operator's optional
//! glob patterns. An empty glob list selects everything the allowlist let
//! through.

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::github::types::PrFile;

/// Extensions considered reviewable source text.
const TEXT_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".json", ".mjs", ".cjs", ".py", ".rb", ".go", ".java", ".kt",
    ".cs", ".php", ".rs", ".css", ".scss", ".sass", ".less", ".md", ".yml", ".yaml", ".sql",
    ".sh", ".toml", ".ini",
];

/// True when the filename ends in one of the known text extensions.
pub fn is_text_file(filename: &str) -> bool {
    TEXT_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

/// Applies the allowlist and the configured globs, preserving file order.
///
/// Unparseable glob patterns are skipped with a diagnostic rather than
/// failing the review.
pub fn select_files<'a>(files: &'a [PrFile], globs: &[String]) -> Vec<&'a PrFile> {
    let glob_set = build_glob_set(globs);

    files
        .iter()
        .filter(|f| is_text_file(&f.filename))
        .filter(|f| match &glob_set {
            Some(set) => set.is_match(&f.filename),
            None => true,
        })
        .collect()
}

fn build_glob_set(globs: &[String]) -> Option<GlobSet> {
    if globs.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    let mut any = false;
    for pattern in globs {
        match Glob::new(pattern) {
            Ok(g) => {
                builder.add(g);
                any = true;
            }
            Err(e) => warn!(pattern = %pattern, error = %e, "skipping invalid file glob"),
        }
    }
    if !any {
        return None;
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(e) => {
            warn!(error = %e, "failed to build glob set; selecting all text files");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr_file(name: &str) -> PrFile {
        PrFile {
            filename: name.to_string(),
            status: "modified".to_string(),
            additions: 0,
            deletions: 0,
            patch: None,
        }
    }

    #[test]
    fn only_known_text_extensions_pass() {
        assert!(is_text_file("src/lib.rs"));
        assert!(is_text_file("config.yaml"));
        assert!(!is_text_file("logo.png"));
        assert!(!is_text_file("binary"));
    }

    #[test]
    fn empty_glob_list_selects_all_text_files() {
        let files = vec![pr_file("a.rs"), pr_file("b.png"), pr_file("c.md")];
        let selected = select_files(&files, &[]);
        let names: Vec<&str> = selected.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "c.md"]);
    }

    #[test]
    fn globs_narrow_the_selection_in_order() {
        let files = vec![pr_file("src/a.rs"), pr_file("docs/b.md"), pr_file("src/c.rs")];
        let selected = select_files(&files, &["src/**/*.rs".to_string()]);
        let names: Vec<&str> = selected.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["src/a.rs", "src/c.rs"]);
    }

    #[test]
    fn invalid_globs_are_ignored() {
        let files = vec![pr_file("a.rs")];
        let selected = select_files(&files, &["[".to_string()]);
        assert_eq!(selected.len(), 1);
    }
}
