use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Planner proposes a plan file, builder implements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Planner,
    Builder,
}

impl SessionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Builder => "builder",
        }
    }
}

/// Lifecycle of a supervised agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Running,
    /// Finished a turn and is waiting for a follow-up.
    Idle,
    Completed,
    Stopped,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    /// Non-terminal and not idle: blocks merging.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "[~]",
            Self::Running => "[>]",
            Self::Idle => "[z]",
            Self::Completed => "[+]",
            Self::Stopped => "[-]",
            Self::Failed => "[x]",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

/// Snapshot of one session as reported by the session manager.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub kind: SessionKind,
    pub worktree_path: PathBuf,
    pub status: SessionStatus,
    pub model: String,
    pub prompt: String,
    pub started_at: DateTime<Local>,
    pub output: Vec<String>,
}

impl SessionInfo {
    pub fn title(&self) -> String {
        let first_line = self.prompt.lines().next().unwrap_or("");
        format!("{} {}", self.kind.label(), first_line)
    }

    /// Human "started 5m ago" label.
    pub fn age_label(&self, now: DateTime<Local>) -> String {
        let secs = (now - self.started_at).num_seconds().max(0);
        match secs {
            0..=59 => format!("{}s", secs),
            60..=3599 => format!("{}m", secs / 60),
            _ => format!("{}h", secs / 3600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_neither_terminal_nor_active() {
        assert!(!SessionStatus::Idle.is_terminal());
        assert!(!SessionStatus::Idle.is_active());
        assert!(SessionStatus::Running.is_active());
        assert!(SessionStatus::Pending.is_active());
        assert!(SessionStatus::Stopped.is_terminal());
    }

    #[test]
    fn age_label_buckets() {
        let now = Local::now();
        let info = SessionInfo {
            id: "s1".into(),
            kind: SessionKind::Planner,
            worktree_path: PathBuf::from("/tmp/wt"),
            status: SessionStatus::Running,
            model: "sonnet".into(),
            prompt: "add login\nmore".into(),
            started_at: now - chrono::Duration::minutes(5),
            output: Vec::new(),
        };
        assert_eq!(info.age_label(now), "5m");
        assert_eq!(info.title(), "planner add login");
    }
}
