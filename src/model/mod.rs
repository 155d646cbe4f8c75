pub mod confirm;
pub mod focus;
pub mod git;
pub mod github;
pub mod routing;
pub mod session;
pub mod toast;
pub mod view;
pub mod worktree;
