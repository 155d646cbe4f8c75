use std::path::Path;

use anyhow::{bail, Result};

use crate::data::command::run_captured;
use crate::model::git::{GitChanges, GitSummary};

fn git_stdout(cwd: &Path, args: &[&str]) -> Result<String> {
    let output = run_captured("git", args, cwd)?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Count staged, unstaged and untracked files from `git status --porcelain`.
fn count_changes(porcelain: &str) -> GitChanges {
    let mut changes = GitChanges::default();
    for line in porcelain.lines() {
        let mut codes = line.chars();
        let (Some(index), Some(worktree)) = (codes.next(), codes.next()) else {
            continue;
        };
        if index == '?' && worktree == '?' {
            changes.untracked += 1;
            continue;
        }
        if index != ' ' {
            changes.staged += 1;
        }
        if worktree != ' ' {
            changes.unstaged += 1;
        }
    }
    changes
}

/// Commits on HEAD that no remote-tracking ref contains yet.
fn count_unpushed(cwd: &Path) -> Result<u32> {
    let out = git_stdout(cwd, &["rev-list", "--count", "HEAD", "--not", "--remotes"])?;
    Ok(out.trim().parse()?)
}

/// Local changes plus unpushed commit count for one worktree.
pub fn load_summary(cwd: &Path) -> Result<GitSummary> {
    let porcelain = git_stdout(cwd, &["status", "--porcelain"])?;
    Ok(GitSummary {
        changes: count_changes(&porcelain),
        ahead: count_unpushed(cwd)?,
    })
}
