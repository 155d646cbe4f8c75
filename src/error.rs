use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },
    #[error("gh {command} failed: {message}")]
    GitHub { command: String, message: String },
    #[error("worktree for branch '{0}' not found")]
    NotFound(String),
    #[error("invalid branch name '{0}'")]
    InvalidBranch(String),
    #[error("{failed} of {total} worktrees failed to sync")]
    PartialSync { failed: usize, total: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(String),
    #[error("session '{0}' is busy")]
    Busy(String),
    #[error("session '{0}' has already finished")]
    Finished(String),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("router process failed: {0}")]
    Process(String),
    #[error("router returned no routing decision")]
    MissingDecision,
    #[error("router returned an unreadable decision: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("router proposed an empty worktree name")]
    EmptyTarget,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
