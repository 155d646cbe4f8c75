use std::path::PathBuf;

use tracing::{debug, warn};

use crate::data::command::{failure_message, run_captured};
use crate::data::prompts::build_routing_prompt;
use crate::error::RouterError;
use crate::model::routing::TaskRoutingProposal;
use crate::model::worktree::Worktree;

/// Proposes where a free-text task should run.
pub trait TaskRouter: Send + Sync {
    fn route(
        &self,
        task: &str,
        worktrees: &[Worktree],
        default_branch: &str,
    ) -> Result<TaskRoutingProposal, RouterError>;
}

/// Asks a small model through `claude -p` for a JSON routing decision.
pub struct AgentTaskRouter {
    program: String,
    model: String,
    cwd: PathBuf,
}

impl AgentTaskRouter {
    pub fn new(program: impl Into<String>, model: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
            cwd,
        }
    }
}

impl TaskRouter for AgentTaskRouter {
    fn route(
        &self,
        task: &str,
        worktrees: &[Worktree],
        default_branch: &str,
    ) -> Result<TaskRoutingProposal, RouterError> {
        let prompt = build_routing_prompt(task, worktrees, default_branch);
        let output = run_captured(
            &self.program,
            &["-p", &prompt, "--model", &self.model],
            &self.cwd,
        )
        .map_err(|e| RouterError::Process(e.to_string()))?;

        if !output.status.success() {
            let message = failure_message(&output);
            warn!(%message, "router process failed");
            return Err(RouterError::Process(message));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(bytes = stdout.len(), "router answered");
        parse_proposal(&stdout)
    }
}

/// Extract the JSON object from a model reply, tolerating prose or code
/// fences around it.
pub fn parse_proposal(reply: &str) -> Result<TaskRoutingProposal, RouterError> {
    let start = reply.find('{').ok_or(RouterError::MissingDecision)?;
    let end = reply.rfind('}').ok_or(RouterError::MissingDecision)?;
    if end < start {
        return Err(RouterError::MissingDecision);
    }
    let mut proposal: TaskRoutingProposal = serde_json::from_str(&reply[start..=end])?;
    proposal.worktree = proposal.worktree.trim().to_string();
    proposal.parent = proposal
        .parent
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty() && p != "null");
    if proposal.worktree.is_empty() {
        return Err(RouterError::EmptyTarget);
    }
    Ok(proposal)
}
