//! # Git Module
//!
//! Repository context for the git widgets: branch and linked-worktree
//! detection via gix, uncommitted line counts via `git diff --shortstat`
//! (staged and unstaged summed).

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Command;

use crate::models::GitStatus;

static INSERTIONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) insertion").unwrap());
static DELETIONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) deletion").unwrap());

pub fn read_git_status(start_dir: &Path) -> Option<GitStatus> {
    let repo = gix::discover(start_dir).ok()?;
    let mut status = GitStatus {
        is_git_repo: true,
        ..GitStatus::default()
    };

    if let Ok(head) = repo.head() {
        if let Some(name) = head.referent_name() {
            status.branch = Some(name.shorten().to_string());
        }
    }

    // Linked worktrees have a .git file instead of a directory
    if let Some(wd) = repo.work_dir() {
        if wd.join(".git").is_file() {
            status.worktree = wd
                .file_name()
                .map(|n| n.to_string_lossy().to_string());
        }
    }

    let (insertions, deletions) = diff_shortstat(start_dir);
    status.insertions = insertions;
    status.deletions = deletions;

    Some(status)
}

/// Uncommitted +/- line counts, staged plus unstaged. Any git failure
/// yields zeroes rather than an error.
fn diff_shortstat(dir: &Path) -> (u64, u64) {
    let mut insertions = 0;
    let mut deletions = 0;
    for args in [
        &["diff", "--shortstat"][..],
        &["diff", "--cached", "--shortstat"][..],
    ] {
        let Ok(output) = Command::new("git").args(args).current_dir(dir).output() else {
            continue;
        };
        if !output.status.success() {
            continue;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        insertions += capture_count(&INSERTIONS_RE, &stdout);
        deletions += capture_count(&DELETIONS_RE, &stdout);
    }
    (insertions, deletions)
}

fn capture_count(re: &Regex, stat_output: &str) -> u64 {
    re.captures(stat_output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortstat_parsing() {
        let line = " 3 files changed, 42 insertions(+), 7 deletions(-)";
        assert_eq!(capture_count(&INSERTIONS_RE, line), 42);
        assert_eq!(capture_count(&DELETIONS_RE, line), 7);
        assert_eq!(capture_count(&INSERTIONS_RE, " 1 file changed, 2 deletions(-)"), 0);
    }

    #[test]
    fn non_repo_dir_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_git_status(dir.path()).is_none());
    }
}
