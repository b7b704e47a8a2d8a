//! Version-history freshness lookup.
//!
//! Asks `git log` for the commit timestamp of the most recent commit
//! touching a file. The result is the freshness marker that drives
//! reconciliation; `None` (no repository, no history, git missing) sorts
//! as oldest, so a source without history never supersedes anything
//! already indexed.

use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Utc};

/// Last commit time of one file inside a working tree, or `None` when no
/// repository or history exists for it.
///
/// Runs `git log -1 --format=%cI -- <path>` relative to `repo_dir`. Any
/// failure (git not installed, not a repository, untracked file) is a
/// non-fatal `None`, never an error: missing history is an expected state
/// for freshly created files.
pub fn file_last_commit_time(repo_dir: &Path, file_path: &Path) -> Option<DateTime<Utc>> {
    let output = Command::new("git")
        .args(["log", "-1", "--format=%cI", "--"])
        .arg(file_path)
        .current_dir(repo_dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    parse_commit_timestamp(raw.trim())
}

/// Parse git's `%cI` (strict ISO-8601) output into a typed UTC instant.
///
/// Parsed comparison replaces the string comparison the format happens to
/// permit; offsets are normalized to UTC so markers from different
/// committer timezones stay totally ordered.
pub fn parse_commit_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
