use std::path::PathBuf;

use crate::model::git::GitSummary;
use crate::model::github::PullRequest;

/// A git working tree checked out from the shared repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: String,
    pub head: String,
    pub is_main: bool,
}

impl Worktree {
    pub fn name(&self) -> &str {
        if self.branch.is_empty() {
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("(detached)")
        } else {
            &self.branch
        }
    }
}

/// Status of one worktree, assembled from two independent fetches. Each
/// fetch only ever writes its own half, so they can land in either order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorktreeStatus {
    pub git: Option<GitSummary>,
    pub pr: Option<PullRequest>,
}

impl WorktreeStatus {
    pub fn pr_number(&self) -> u64 {
        self.pr.as_ref().map(|pr| pr.number).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeOpKind {
    Create,
    Delete,
    Sync,
    Reset,
}

impl WorktreeOpKind {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::Sync => "Sync",
            Self::Reset => "Reset",
        }
    }

    pub fn progressive(&self) -> &'static str {
        match self {
            Self::Create => "Creating",
            Self::Delete => "Deleting",
            Self::Sync => "Syncing",
            Self::Reset => "Resetting",
        }
    }
}

/// Outcome of an asynchronous worktree operation.
///
/// `branch` is only set by a create that succeeded; nothing else may set
/// it, otherwise the auto-select that follows a create would misfire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorktreeOpResult {
    pub lines: Vec<String>,
    pub branch: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl WorktreeOpResult {
    pub fn failed(lines: Vec<String>, error: impl Into<String>) -> Self {
        Self {
            lines,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// The branch to auto-select, if this was a successful create.
    pub fn created_branch(&self) -> Option<&str> {
        if self.error.is_some() {
            return None;
        }
        self.branch.as_deref().filter(|b| !b.is_empty())
    }
}

/// One-shot marker: select `branch` once the next worktree list arrives and
/// optionally feed `prompt` into a new planner session there.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWorktreeSelect {
    pub branch: String,
    pub prompt: Option<String>,
}
