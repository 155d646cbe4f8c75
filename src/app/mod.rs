//! The central controller: all UI state plus the reducer that advances it.
//!
//! State only changes inside [`update::update`]. Handlers never perform I/O;
//! they queue [`Effect`]s on the outbox, which `update` drains and returns.

mod keys;
mod merge_flow;
mod overlays;
mod routing_flow;
mod session_flow;
pub mod update;
mod worktree_flow;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;
use tui_textarea::TextArea;

use crate::config::{ProjectConfig, Settings};
use crate::effect::{Effect, Timer};
use crate::model::confirm::ConfirmRequest;
use crate::model::focus::{FocusMode, Pane};
use crate::model::session::{SessionInfo, SessionKind};
use crate::model::toast::{ToastLevel, ToastQueue, TOAST_TICK};
use crate::model::view::SessionViewState;
use crate::model::worktree::{PendingWorktreeSelect, Worktree, WorktreeOpKind, WorktreeStatus};

pub use overlays::{HookField, RepoSettingsEditor};
pub use routing_flow::{AdjustField, TaskModal, TaskStage};

/// What a submitted text input is for.
#[derive(Debug, Clone, PartialEq)]
pub enum InputPurpose {
    NewWorktree,
    SessionPrompt { kind: SessionKind, path: PathBuf },
    FollowUp { session_id: String },
}

impl InputPurpose {
    pub fn title(&self) -> String {
        match self {
            Self::NewWorktree => "New worktree branch".to_string(),
            Self::SessionPrompt { kind, .. } => format!("Start {}", kind.label()),
            Self::FollowUp { .. } => "Follow-up".to_string(),
        }
    }
}

pub struct InputState {
    pub purpose: InputPurpose,
    pub editor: TextArea<'static>,
}

impl InputState {
    pub fn new(purpose: InputPurpose) -> Self {
        let mut editor = TextArea::default();
        editor.set_cursor_line_style(ratatui::style::Style::default());
        Self { purpose, editor }
    }

    pub fn text(&self) -> String {
        self.editor.lines().join("\n").trim().to_string()
    }
}

pub struct App {
    pub repo_name: String,
    pub gh_repo: Option<String>,
    pub config: ProjectConfig,
    pub settings: Settings,

    pub focus: FocusMode,
    pub toasts: ToastQueue,
    pub confirm: Option<ConfirmRequest>,
    /// Prompt raised while another layer owned the keyboard; shown once
    /// focus is back on the output.
    pub deferred_confirm: Option<ConfirmRequest>,

    pub worktrees: Vec<Worktree>,
    /// Keyed by worktree name.
    pub statuses: HashMap<String, WorktreeStatus>,
    /// At least one PR fetch has completed.
    pub prs_loaded: bool,
    pub selected: Option<String>,
    pub sessions: Vec<SessionInfo>,

    pub panes: [SessionViewState; 2],
    pub active_pane: Pane,
    pub split: bool,

    pub dropdown_index: usize,
    pub input: Option<InputState>,
    pub task_modal: Option<TaskModal>,
    pub theme_index: usize,
    pub repo_settings: Option<RepoSettingsEditor>,
    pub all_sessions_index: usize,

    pub op_in_flight: Option<WorktreeOpKind>,
    pub merge_in_flight: bool,
    /// Progress lines of every worktree op and merge, oldest first.
    pub op_log: Vec<String>,
    pub pending_select: Option<PendingWorktreeSelect>,
    pub pending_quit: bool,
    pub session_poll_scheduled: bool,
    pub routing_seq: u64,

    outbox: Vec<Effect>,
}

impl App {
    pub fn new(
        repo_root: PathBuf,
        config: ProjectConfig,
        settings: Settings,
        gh_repo: Option<String>,
    ) -> Self {
        let repo_name = crate::config::repo_name(&repo_root);
        Self {
            repo_name,
            gh_repo,
            config,
            settings,
            focus: FocusMode::Output,
            toasts: ToastQueue::new(),
            confirm: None,
            deferred_confirm: None,
            worktrees: Vec::new(),
            statuses: HashMap::new(),
            prs_loaded: false,
            selected: None,
            sessions: Vec::new(),
            panes: [SessionViewState::default(), SessionViewState::default()],
            active_pane: Pane::Left,
            split: false,
            dropdown_index: 0,
            input: None,
            task_modal: None,
            theme_index: 0,
            repo_settings: None,
            all_sessions_index: 0,
            op_in_flight: None,
            merge_in_flight: false,
            op_log: Vec::new(),
            pending_select: None,
            pending_quit: false,
            session_poll_scheduled: false,
            routing_seq: 0,
            outbox: Vec::new(),
        }
    }

    /// Initial loads and the first tick of each periodic poll.
    pub fn startup_effects(&self) -> Vec<Effect> {
        vec![
            Effect::LoadWorktrees,
            Effect::LoadPrStatuses,
            Effect::LoadSessions,
            Effect::Schedule {
                after: Duration::from_secs(self.config.git_status_secs()),
                timer: Timer::GitStatusPoll,
            },
            Effect::Schedule {
                after: Duration::from_secs(self.config.pr_status_secs()),
                timer: Timer::PrStatusPoll,
            },
        ]
    }

    pub(crate) fn emit(&mut self, effect: Effect) {
        self.outbox.push(effect);
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbox)
    }

    /// Show a toast, scheduling the expiry tick if none is outstanding.
    pub(crate) fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        if self.toasts.add(message, level, Instant::now()) {
            self.emit(Effect::Schedule {
                after: TOAST_TICK,
                timer: Timer::ToastExpiry,
            });
        }
    }

    pub(crate) fn set_focus(&mut self, focus: FocusMode) {
        if self.focus != focus {
            debug!(from = self.focus.label(), to = focus.label(), "focus");
            self.focus = focus;
            self.pending_quit = false;
        }
    }

    /// Open a confirmation prompt, replacing any prompt already open.
    pub(crate) fn show_confirm(&mut self, request: ConfirmRequest) {
        self.input = None;
        self.pending_quit = false;
        self.confirm = Some(request);
        self.set_focus(FocusMode::Confirm);
    }

    /// Open a prompt that did not come from a key press. While another layer
    /// owns the keyboard the prompt waits until focus returns to the output.
    pub(crate) fn queue_confirm(&mut self, request: ConfirmRequest) {
        if self.focus == FocusMode::Output {
            self.show_confirm(request);
        } else {
            debug!(focus = self.focus.label(), "confirmation deferred");
            self.deferred_confirm = Some(request);
        }
    }

    pub(crate) fn show_deferred_confirm(&mut self) {
        if self.focus != FocusMode::Output {
            return;
        }
        if let Some(request) = self.deferred_confirm.take() {
            self.show_confirm(request);
        }
    }

    /// Clear the prompt together with its focus, returning the request.
    pub(crate) fn close_confirm(&mut self) -> Option<ConfirmRequest> {
        self.set_focus(FocusMode::Output);
        self.confirm.take()
    }

    // -----------------------------------------------------------------------
    // Worktree selection
    // -----------------------------------------------------------------------

    pub fn selected_worktree(&self) -> Option<&Worktree> {
        let name = self.selected.as_deref()?;
        self.worktrees.iter().find(|wt| wt.name() == name)
    }

    pub fn worktree_by_name(&self, name: &str) -> Option<&Worktree> {
        self.worktrees.iter().find(|wt| wt.name() == name)
    }

    pub fn worktree_for_path(&self, path: &Path) -> Option<&Worktree> {
        self.worktrees.iter().find(|wt| wt.path == path)
    }

    pub fn status_of(&self, name: &str) -> Option<&WorktreeStatus> {
        self.statuses.get(name)
    }

    /// Select a worktree and show its most recent session in the active pane.
    pub(crate) fn select_worktree(&mut self, name: &str) {
        let Some(path) = self.worktree_by_name(name).map(|wt| wt.path.clone()) else {
            return;
        };
        debug!(worktree = name, "select worktree");
        self.selected = Some(name.to_string());
        let latest = self
            .sessions
            .iter()
            .filter(|s| s.worktree_path == path)
            .last()
            .map(|s| s.id.clone());
        self.view_mut().switch_to(latest);
    }

    // -----------------------------------------------------------------------
    // Sessions and panes
    // -----------------------------------------------------------------------

    pub fn sessions_for_path(&self, path: &Path) -> Vec<&SessionInfo> {
        self.sessions
            .iter()
            .filter(|s| s.worktree_path == path)
            .collect()
    }

    pub fn sessions_for_selected(&self) -> Vec<&SessionInfo> {
        match self.selected_worktree() {
            Some(wt) => self.sessions_for_path(&wt.path),
            None => Vec::new(),
        }
    }

    pub fn session(&self, id: &str) -> Option<&SessionInfo> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn non_terminal_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| !s.status.is_terminal())
            .count()
    }

    pub fn pane_index(pane: Pane) -> usize {
        match pane {
            Pane::Left => 0,
            Pane::Right => 1,
        }
    }

    pub fn view(&self) -> &SessionViewState {
        &self.panes[Self::pane_index(self.active_pane)]
    }

    pub(crate) fn view_mut(&mut self) -> &mut SessionViewState {
        &mut self.panes[Self::pane_index(self.active_pane)]
    }

    pub fn viewed_session(&self) -> Option<&SessionInfo> {
        let id = self.view().viewing.as_deref()?;
        self.session(id)
    }

    /// Drop every pane's pointer to sessions of the worktree at `path`.
    pub(crate) fn clear_views_for_path(&mut self, path: &Path) {
        let ids: Vec<String> = self
            .sessions_for_path(path)
            .iter()
            .map(|s| s.id.clone())
            .collect();
        for pane in self.panes.iter_mut() {
            if pane.viewing.as_ref().map(|v| ids.contains(v)).unwrap_or(false) {
                pane.clear();
            }
        }
    }

    pub(crate) fn ensure_session_poll(&mut self) {
        if self.session_poll_scheduled {
            return;
        }
        self.session_poll_scheduled = true;
        self.emit(Effect::Schedule {
            after: Duration::from_millis(self.config.session_millis()),
            timer: Timer::SessionPoll,
        });
    }

    pub(crate) fn git_status_targets(&self) -> Vec<(String, PathBuf)> {
        self.worktrees
            .iter()
            .map(|wt| (wt.name().to_string(), wt.path.clone()))
            .collect()
    }

    pub fn theme(&self) -> crate::ui::theme::Theme {
        crate::ui::theme::theme_by_name(&self.settings.theme)
    }
}
