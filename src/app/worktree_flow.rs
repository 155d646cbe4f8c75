use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::{session_flow, App};
use crate::effect::Effect;
use crate::model::confirm::{ConfirmPrompt, ConfirmRequest, PendingAction};
use crate::model::session::SessionKind;
use crate::model::toast::ToastLevel;
use crate::model::worktree::{PendingWorktreeSelect, Worktree, WorktreeOpKind, WorktreeOpResult};

/// Only one worktree op runs at a time. Returns `false` (after telling the
/// user) when another is still in flight.
fn claim_op(app: &mut App, kind: WorktreeOpKind) -> bool {
    if let Some(running) = app.op_in_flight {
        app.toast(
            ToastLevel::Info,
            format!("{} already in progress", running.progressive()),
        );
        return false;
    }
    app.op_in_flight = Some(kind);
    true
}

pub(super) fn request_create(
    app: &mut App,
    branch: String,
    parent: Option<String>,
    auto_prompt: Option<String>,
) {
    let branch = branch.trim().to_string();
    if branch.is_empty() || branch.chars().any(char::is_whitespace) {
        app.toast(ToastLevel::Info, format!("Invalid branch name '{}'", branch));
        return;
    }
    if app.worktree_by_name(&branch).is_some() {
        app.toast(ToastLevel::Info, format!("Worktree {} already exists", branch));
        return;
    }
    if !claim_op(app, WorktreeOpKind::Create) {
        return;
    }

    let line = match parent.as_deref() {
        Some(p) => format!("Creating worktree {} from {}…", branch, p),
        None => format!("Creating worktree {}…", branch),
    };
    app.op_log.push(line);
    debug!(%branch, ?parent, auto = auto_prompt.is_some(), "create worktree");

    let hooks = app.settings.hooks_for(&app.repo_name).on_worktree_create;
    app.emit(Effect::CreateWorktree {
        branch,
        parent,
        hooks,
        auto_prompt,
    });
}

pub(super) fn request_delete(app: &mut App) {
    let Some(wt) = app.selected_worktree().cloned() else {
        app.toast(ToastLevel::Info, "No worktree selected");
        return;
    };
    if wt.is_main {
        app.toast(ToastLevel::Info, "The main worktree cannot be deleted");
        return;
    }
    if app.sessions_for_path(&wt.path).iter().any(|s| s.status.is_active()) {
        app.toast(
            ToastLevel::Info,
            format!("A session is still running in {}; stop it first", wt.name()),
        );
        return;
    }

    let prompt = ConfirmPrompt::new(
        format!("Delete worktree {}?", wt.name()),
        &[('k', "keep branch"), ('d', "delete branch")],
    );
    app.show_confirm(ConfirmRequest::new(
        prompt,
        PendingAction::DeleteWorktree {
            branch: wt.branch.clone(),
            path: wt.path.clone(),
        },
    ));
}

pub(super) fn start_delete(app: &mut App, branch: String, path: PathBuf, delete_branch: bool) {
    if !claim_op(app, WorktreeOpKind::Delete) {
        return;
    }
    app.op_log.push(format!("Deleting worktree {}…", branch));
    let hooks = app.settings.hooks_for(&app.repo_name).on_worktree_delete;
    app.emit(Effect::DeleteWorktree {
        branch,
        path,
        delete_branch,
        hooks,
    });
}

pub(super) fn start_sync(app: &mut App, branch: Option<String>) {
    if !claim_op(app, WorktreeOpKind::Sync) {
        return;
    }
    let line = match branch.as_deref() {
        Some(b) => format!("Syncing worktree {}…", b),
        None => "Syncing all worktrees…".to_string(),
    };
    app.op_log.push(line);
    app.emit(Effect::SyncWorktrees { branch });
}

pub(super) fn start_reset(app: &mut App, branch: String) {
    if !claim_op(app, WorktreeOpKind::Reset) {
        return;
    }
    app.op_log
        .push(format!("Resetting worktree {} to the default branch…", branch));
    app.emit(Effect::ResetWorktree { branch });
}

pub(super) fn on_op_finished(
    app: &mut App,
    kind: WorktreeOpKind,
    target: Option<String>,
    auto_prompt: Option<String>,
    result: WorktreeOpResult,
) {
    app.op_in_flight = None;
    let subject = target
        .clone()
        .unwrap_or_else(|| "all worktrees".to_string());

    match &result.error {
        Some(error) => {
            warn!(op = kind.verb(), %subject, %error, "worktree op failed");
            app.toast(
                ToastLevel::Error,
                format!("{} {} failed: {}", kind.verb(), subject, error),
            );
        }
        None => {
            info!(op = kind.verb(), %subject, "worktree op finished");
            app.toast(ToastLevel::Success, format!("{} {} done", kind.verb(), subject));
            if let Some(warning) = &result.warning {
                app.toast(ToastLevel::Warning, warning.clone());
            }
        }
    }

    if let Some(branch) = result.created_branch() {
        app.pending_select = Some(PendingWorktreeSelect {
            branch: branch.to_string(),
            prompt: auto_prompt,
        });
    } else {
        app.pending_select = None;
    }

    // Sessions of a removed or reset worktree no longer match its files.
    if result.succeeded() && matches!(kind, WorktreeOpKind::Delete | WorktreeOpKind::Reset) {
        let affected = target
            .as_deref()
            .and_then(|b| app.worktrees.iter().find(|wt| wt.branch == b))
            .map(|wt| (wt.name().to_string(), wt.path.clone()));
        if let Some((name, path)) = affected {
            if app.selected.as_deref() == Some(name.as_str()) {
                app.clear_views_for_path(&path);
                if kind == WorktreeOpKind::Delete {
                    app.selected = None;
                }
            }
            if kind == WorktreeOpKind::Delete {
                app.statuses.remove(&name);
            }
        }
    }

    app.op_log.extend(result.lines);
    app.emit(Effect::LoadWorktrees);
    app.emit(Effect::LoadPrStatuses);
}

pub(super) fn on_worktrees_loaded(app: &mut App, result: Result<Vec<Worktree>, String>) {
    let worktrees = match result {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "failed to list worktrees");
            app.toast(ToastLevel::Error, format!("Failed to list worktrees: {}", e));
            return;
        }
    };

    app.worktrees = worktrees;
    let names: Vec<String> = app.worktrees.iter().map(|wt| wt.name().to_string()).collect();
    app.statuses.retain(|name, _| names.contains(name));

    if let Some(selected) = app.selected.clone() {
        if !names.contains(&selected) {
            debug!(worktree = %selected, "selected worktree disappeared");
            app.selected = None;
            for pane in app.panes.iter_mut() {
                pane.clear();
            }
        }
    }
    if app.selected.is_none() {
        if let Some(first) = names.first().cloned() {
            app.select_worktree(&first);
        }
    }

    // A list that predates the create does not contain the branch yet; keep
    // waiting for the next one.
    let ready = app
        .pending_select
        .as_ref()
        .map(|p| names.contains(&p.branch))
        .unwrap_or(false);
    if ready {
        if let Some(pending) = app.pending_select.take() {
            app.select_worktree(&pending.branch);
            if let Some(prompt) = pending.prompt {
                if let Some(path) = app.worktree_by_name(&pending.branch).map(|wt| wt.path.clone()) {
                    session_flow::start_session(app, SessionKind::Planner, path, prompt);
                }
            }
        }
    }

    let targets = app.git_status_targets();
    app.emit(Effect::LoadGitStatuses(targets));
}
