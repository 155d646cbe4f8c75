use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAction {
    UseExisting,
    CreateNew,
}

/// Where a free-text task should run, as proposed by the router.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskRoutingProposal {
    pub action: RoutingAction,
    #[serde(alias = "branch")]
    pub worktree: String,
    #[serde(default, alias = "parent_branch")]
    pub parent: Option<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl TaskRoutingProposal {
    pub fn summary(&self) -> String {
        match self.action {
            RoutingAction::UseExisting => format!("Use existing worktree {}", self.worktree),
            RoutingAction::CreateNew => match self.parent.as_deref() {
                Some(parent) if !parent.is_empty() => {
                    format!("Create worktree {} from {}", self.worktree, parent)
                }
                _ => format!("Create worktree {}", self.worktree),
            },
        }
    }
}
