//! Markdown source extractor.
//!
//! Walks a configured subtree of the docs repository and produces one
//! [`DocUnit`] per Markdown file, with the repo-relative path as
//! `source_path` and the file's last commit time as freshness marker.
//! Chunking happens later in the pipeline; the unit leaving here is the
//! whole file body.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::gitlog;
use crate::models::DocUnit;

/// Matches `.md` and `.mdx` (the original corpus mixes both).
const MARKDOWN_GLOBS: &[&str] = &["**/*.md", "**/*.mdx"];

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/node_modules/**", "**/target/**"];

/// Scan `repo_root/subdir` recursively for Markdown files.
///
/// Unreadable files are warned about and skipped; a missing subtree is
/// fatal (it means the site configuration points nowhere). Output is
/// sorted by `source_path` so same-source runs are contiguous and the
/// pass order is deterministic.
pub fn scan_markdown(repo_root: &Path, subdir: &str) -> Result<Vec<DocUnit>> {
    let scan_root = repo_root.join(subdir);
    if !scan_root.exists() {
        bail!(
            "Markdown scan root does not exist: {}",
            scan_root.display()
        );
    }

    let include_set = build_globset(MARKDOWN_GLOBS)?;
    let exclude_set = build_globset(DEFAULT_EXCLUDES)?;

    let mut units = Vec::new();

    for entry in WalkDir::new(&scan_root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&scan_root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        // source_path is relative to the repo root, not the scan root, so
        // keys stay stable if the same file is reachable via two site
        // configurations.
        let source_path = path
            .strip_prefix(repo_root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                eprintln!("Warning: skipping unreadable file {}: {}", path.display(), e);
                continue;
            }
        };

        let mut unit = DocUnit::new(body, Some(source_path));
        unit.freshness_marker = gitlog::file_last_commit_time(repo_root, path);
        units.push(unit);
    }

    units.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    Ok(units)
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_md_and_mdx_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(docs.join("nested")).unwrap();
        fs::write(docs.join("a.md"), "# A").unwrap();
        fs::write(docs.join("nested/b.mdx"), "# B").unwrap();
        fs::write(docs.join("c.txt"), "not docs").unwrap();

        let units = scan_markdown(tmp.path(), "docs").unwrap();
        let paths: Vec<_> = units.iter().map(|u| u.source_path_str()).collect();
        assert_eq!(paths, vec!["docs/a.md", "docs/nested/b.mdx"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(scan_markdown(tmp.path(), "absent").is_err());
    }

    #[test]
    fn test_no_history_means_no_marker() {
        let tmp = tempfile::TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.md"), "# A").unwrap();

        let units = scan_markdown(tmp.path(), "docs").unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].freshness_marker.is_none());
    }
}
