use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::KeyEvent;

use crate::config::Settings;
use crate::effect::Timer;
use crate::model::git::GitSummary;
use crate::model::github::PullRequest;
use crate::model::routing::TaskRoutingProposal;
use crate::model::session::{SessionInfo, SessionKind};
use crate::model::worktree::{Worktree, WorktreeOpKind, WorktreeOpResult};

/// Session operations whose completion carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Stop,
    FollowUp,
    Complete,
}

impl SessionAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stop => "Stop",
            Self::FollowUp => "Follow-up",
            Self::Complete => "Complete",
        }
    }
}

/// All events the app loop handles: keystrokes, timer fires and the result
/// of every deferred command.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    TimerFired(Timer, Instant),
    WorktreesLoaded(Result<Vec<Worktree>, String>),
    /// Git half of worktree statuses, keyed by worktree name.
    GitStatusesLoaded(HashMap<String, GitSummary>),
    /// PR half of worktree statuses, keyed by head branch.
    PrStatusesLoaded(Result<HashMap<String, PullRequest>, String>),
    WorktreeOpFinished {
        kind: WorktreeOpKind,
        /// Branch the op ran against; `None` for a sync of every worktree.
        target: Option<String>,
        /// Prompt for a planner to start once a created worktree is selected.
        auto_prompt: Option<String>,
        result: WorktreeOpResult,
    },
    MergeFinished {
        branch: String,
        result: Result<u64, String>,
        lines: Vec<String>,
    },
    SessionStarted {
        kind: SessionKind,
        worktree_path: PathBuf,
        result: Result<String, String>,
    },
    SessionsLoaded(Vec<SessionInfo>),
    SessionActionFinished {
        action: SessionAction,
        id: String,
        result: Result<(), String>,
    },
    RoutingFinished {
        request: u64,
        result: Result<TaskRoutingProposal, String>,
    },
    SettingsSaved(Result<(), String>),
    SettingsLoaded(Result<Settings, String>),
    /// tmux window or editor launch finished.
    ExternalFinished {
        label: String,
        result: Result<(), String>,
    },
    /// The repository's git metadata changed on disk.
    GitChanged,
    /// The settings file was edited outside the app.
    SettingsChanged,
}
