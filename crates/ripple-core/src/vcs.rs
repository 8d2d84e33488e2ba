//! Minimal git plumbing: current commit and changed files.

use std::path::Path;
use std::process::Command;

/// Commit label used when the repository is not under git.
pub const WORKTREE_COMMIT: &str = "worktree";

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },
}

fn git(repo_root: &Path, args: &[&str]) -> Result<String, VcsError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()?;
    if !output.status.success() {
        return Err(VcsError::Git {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `git rev-parse HEAD`, or `None` outside a git checkout.
pub fn head_commit(repo_root: &Path) -> Option<String> {
    git(repo_root, &["rev-parse", "HEAD"])
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Commit id to label a build with when the caller did not supply one.
pub fn resolve_commit(repo_root: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => head_commit(repo_root).unwrap_or_else(|| WORKTREE_COMMIT.to_string()),
    }
}

/// Files changed relative to `base` in the working tree, plus untracked files.
pub fn changed_files(repo_root: &Path, base: &str) -> Result<Vec<String>, VcsError> {
    let tracked = git(repo_root, &["diff", "--name-only", base])?;
    let untracked = git(repo_root, &["ls-files", "--others", "--exclude-standard"])?;
    let mut files: Vec<String> = tracked
        .lines()
        .chain(untracked.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}
