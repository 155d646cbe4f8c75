/// Counts from `git status --porcelain` of one worktree. A file that is both
/// staged and modified counts in both columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitChanges {
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
}

impl GitChanges {
    pub fn is_empty(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && self.untracked == 0
    }

    pub fn total_files(&self) -> usize {
        self.staged + self.unstaged + self.untracked
    }
}

/// Git half of a worktree's status: local changes and commits that have not
/// reached any remote yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitSummary {
    pub changes: GitChanges,
    pub ahead: u32,
}

impl GitSummary {
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Compact badge for the worktree list, e.g. `*3 ↑2`.
    pub fn badge(&self) -> String {
        let mut parts = Vec::new();
        if self.is_dirty() {
            parts.push(format!("*{}", self.changes.total_files()));
        }
        if self.ahead > 0 {
            parts.push(format!("↑{}", self.ahead));
        }
        parts.join(" ")
    }
}
