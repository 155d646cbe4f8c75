pub mod cli_detect;
pub mod command;
pub mod git;
pub mod github;
pub mod hooks;
pub mod prompts;
pub mod router;
pub mod sessions;
pub mod tmux;
pub mod worktree;
