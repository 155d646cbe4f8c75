use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info};
use tui_textarea::TextArea;

use super::{session_flow, worktree_flow, App};
use crate::config::AGENT_PROVIDER;
use crate::effect::Effect;
use crate::model::focus::FocusMode;
use crate::model::routing::{RoutingAction, TaskRoutingProposal};
use crate::model::session::SessionKind;
use crate::model::toast::ToastLevel;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskStage {
    /// Typing the task description.
    Prompt,
    /// Waiting for the router.
    Routing,
    Proposal(TaskRoutingProposal),
    /// Hand-editing a create-new proposal.
    Adjust(TaskRoutingProposal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustField {
    Worktree,
    Parent,
}

pub struct TaskModal {
    pub stage: TaskStage,
    pub prompt: TextArea<'static>,
    pub worktree: TextArea<'static>,
    pub parent: TextArea<'static>,
    pub field: AdjustField,
    /// Last routing failure, shown in the modal.
    pub error: Option<String>,
    /// Id of the routing request this modal is waiting on.
    pub request: u64,
}

fn editor(text: &str) -> TextArea<'static> {
    let mut editor = TextArea::default();
    editor.set_cursor_line_style(ratatui::style::Style::default());
    editor.insert_str(text);
    editor
}

impl TaskModal {
    fn new() -> Self {
        Self {
            stage: TaskStage::Prompt,
            prompt: editor(""),
            worktree: editor(""),
            parent: editor(""),
            field: AdjustField::Worktree,
            error: None,
            request: 0,
        }
    }

    pub fn prompt_text(&self) -> String {
        self.prompt.lines().join("\n").trim().to_string()
    }

    fn adjusted(&self, base: &TaskRoutingProposal) -> TaskRoutingProposal {
        let worktree = self.worktree.lines().join("").trim().to_string();
        let parent = self.parent.lines().join("").trim().to_string();
        TaskRoutingProposal {
            action: base.action,
            worktree,
            parent: Some(parent).filter(|p| !p.is_empty()),
            reasoning: base.reasoning.clone(),
        }
    }
}

pub(super) fn open(app: &mut App) {
    if !app.settings.provider_enabled(AGENT_PROVIDER) {
        app.toast(
            ToastLevel::Info,
            format!("Provider '{}' is disabled in settings", AGENT_PROVIDER),
        );
        return;
    }
    app.task_modal = Some(TaskModal::new());
    app.set_focus(FocusMode::TaskModal);
}

fn close(app: &mut App) {
    app.task_modal = None;
    app.set_focus(FocusMode::Output);
}

pub(super) fn task_modal_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        close(app);
        return;
    }
    let Some(modal) = app.task_modal.as_mut() else {
        app.set_focus(FocusMode::Output);
        return;
    };

    match modal.stage.clone() {
        TaskStage::Prompt => {
            if key.code != KeyCode::Enter {
                modal.prompt.input(key);
                return;
            }
            let prompt = modal.prompt_text();
            if prompt.is_empty() {
                modal.error = Some("Describe the task first".to_string());
                return;
            }
            app.routing_seq += 1;
            let request = app.routing_seq;
            modal.error = None;
            modal.stage = TaskStage::Routing;
            modal.request = request;
            let worktrees = app.worktrees.clone();
            debug!(request, "routing task");
            app.emit(Effect::RouteTask {
                request,
                prompt,
                worktrees,
            });
        }
        TaskStage::Routing => {}
        TaskStage::Proposal(proposal) => match key.code {
            KeyCode::Enter => confirm(app, proposal),
            KeyCode::Char('e') if proposal.action == RoutingAction::CreateNew => {
                modal.worktree = editor(&proposal.worktree);
                modal.parent = editor(proposal.parent.as_deref().unwrap_or(""));
                modal.field = AdjustField::Worktree;
                modal.stage = TaskStage::Adjust(proposal);
            }
            _ => {}
        },
        TaskStage::Adjust(base) => match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                modal.field = match modal.field {
                    AdjustField::Worktree => AdjustField::Parent,
                    AdjustField::Parent => AdjustField::Worktree,
                };
            }
            KeyCode::Enter => {
                let adjusted = modal.adjusted(&base);
                if adjusted.worktree.is_empty() {
                    modal.error = Some("Worktree name cannot be empty".to_string());
                    return;
                }
                confirm(app, adjusted);
            }
            _ => match modal.field {
                AdjustField::Worktree => {
                    modal.worktree.input(key);
                }
                AdjustField::Parent => {
                    modal.parent.input(key);
                }
            },
        },
    }
}

/// Execute an accepted proposal and close the modal.
fn confirm(app: &mut App, proposal: TaskRoutingProposal) {
    let prompt = app
        .task_modal
        .as_ref()
        .map(|m| m.prompt_text())
        .unwrap_or_default();
    close(app);
    info!(summary = %proposal.summary(), "task routed");

    match proposal.action {
        RoutingAction::CreateNew => {
            worktree_flow::request_create(app, proposal.worktree, proposal.parent, Some(prompt));
        }
        RoutingAction::UseExisting => {
            let Some(path) = app
                .worktree_by_name(&proposal.worktree)
                .map(|wt| wt.path.clone())
            else {
                app.toast(
                    ToastLevel::Error,
                    format!("Worktree {} not found", proposal.worktree),
                );
                return;
            };
            app.select_worktree(&proposal.worktree);
            session_flow::start_session(app, SessionKind::Planner, path, prompt);
        }
    }
}

pub(super) fn on_routing_finished(
    app: &mut App,
    request: u64,
    result: Result<TaskRoutingProposal, String>,
) {
    let Some(modal) = app.task_modal.as_mut() else {
        debug!(request, "routing result arrived after the modal closed");
        return;
    };
    if modal.stage != TaskStage::Routing || modal.request != request {
        debug!(request, waiting = modal.request, "stale routing result ignored");
        return;
    }
    match result {
        Ok(proposal) => {
            modal.error = None;
            modal.stage = TaskStage::Proposal(proposal);
        }
        Err(e) => {
            modal.error = Some(e);
            modal.stage = TaskStage::Prompt;
        }
    }
}
