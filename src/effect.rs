use std::path::PathBuf;
use std::time::Duration;

use crate::config::Settings;
use crate::model::confirm::MergeMethod;
use crate::model::session::SessionKind;
use crate::model::worktree::Worktree;

/// Self-scheduled timers. Each fires once; the reducer decides whether to
/// schedule the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    ToastExpiry,
    GitStatusPoll,
    PrStatusPoll,
    SessionPoll,
}

/// Deferred work requested by the reducer. The runtime executes each effect
/// off the main loop and posts exactly one `AppEvent` back (`Quit` excepted).
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadWorktrees,
    /// (worktree name, path) pairs to run `git status` in.
    LoadGitStatuses(Vec<(String, PathBuf)>),
    LoadPrStatuses,
    LoadSessions,
    CreateWorktree {
        branch: String,
        parent: Option<String>,
        hooks: Vec<String>,
        auto_prompt: Option<String>,
    },
    DeleteWorktree {
        branch: String,
        path: PathBuf,
        delete_branch: bool,
        hooks: Vec<String>,
    },
    /// `None` syncs every worktree.
    SyncWorktrees {
        branch: Option<String>,
    },
    ResetWorktree {
        branch: String,
    },
    MergePr {
        branch: String,
        method: MergeMethod,
    },
    StartSession {
        kind: SessionKind,
        worktree_path: PathBuf,
        prompt: String,
        model: String,
    },
    StopSession {
        id: String,
    },
    SendFollowUp {
        id: String,
        text: String,
    },
    CompleteSession {
        id: String,
    },
    RouteTask {
        request: u64,
        prompt: String,
        worktrees: Vec<Worktree>,
    },
    SaveSettings(Settings),
    ReloadSettings,
    OpenTmuxWindow {
        name: String,
        path: PathBuf,
    },
    OpenEditor {
        name: String,
        path: PathBuf,
    },
    Schedule {
        after: Duration,
        timer: Timer,
    },
    Quit,
}
