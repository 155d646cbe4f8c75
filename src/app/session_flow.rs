use std::path::PathBuf;

use tracing::{info, warn};

use super::{keys, App, InputPurpose};
use crate::config::AGENT_PROVIDER;
use crate::data::prompts::build_builder_from_plan_prompt;
use crate::effect::Effect;
use crate::event::SessionAction;
use crate::model::confirm::{ConfirmPrompt, ConfirmRequest, PendingAction};
use crate::model::session::{SessionInfo, SessionKind, SessionStatus};
use crate::model::toast::ToastLevel;

fn provider_ready(app: &mut App) -> bool {
    if app.settings.provider_enabled(AGENT_PROVIDER) {
        return true;
    }
    app.toast(
        ToastLevel::Info,
        format!("Provider '{}' is disabled in settings", AGENT_PROVIDER),
    );
    false
}

pub(super) fn open_prompt(app: &mut App, kind: SessionKind) {
    let Some(path) = app.selected_worktree().map(|wt| wt.path.clone()) else {
        app.toast(ToastLevel::Info, "No worktree selected");
        return;
    };
    if !provider_ready(app) {
        return;
    }
    keys::open_input(app, InputPurpose::SessionPrompt { kind, path });
}

pub(super) fn start_session(app: &mut App, kind: SessionKind, path: PathBuf, prompt: String) {
    if !provider_ready(app) {
        return;
    }
    let model = match kind {
        SessionKind::Planner => app.config.planner_model().to_string(),
        SessionKind::Builder => app.config.builder_model().to_string(),
    };
    let name = app
        .worktree_for_path(&path)
        .map(|wt| wt.name().to_string())
        .unwrap_or_else(|| path.display().to_string());
    app.toast(
        ToastLevel::Info,
        format!("Starting {} in {}", kind.label(), name),
    );
    app.emit(Effect::StartSession {
        kind,
        worktree_path: path,
        prompt,
        model,
    });
}

pub(super) fn on_started(
    app: &mut App,
    kind: SessionKind,
    worktree_path: PathBuf,
    result: Result<String, String>,
) {
    match result {
        Ok(id) => {
            info!(session = %id, kind = kind.label(), "session started");
            app.toast(ToastLevel::Success, format!("Started {} session", kind.label()));
            let on_selected = app
                .selected_worktree()
                .map(|wt| wt.path == worktree_path)
                .unwrap_or(false);
            if on_selected {
                app.view_mut().switch_to(Some(id));
            }
            app.emit(Effect::LoadSessions);
            app.ensure_session_poll();
        }
        Err(e) => {
            warn!(kind = kind.label(), error = %e, "session failed to start");
            app.toast(
                ToastLevel::Error,
                format!("Failed to start {}: {}", kind.label(), e),
            );
        }
    }
}

pub(super) fn on_sessions_loaded(app: &mut App, sessions: Vec<SessionInfo>) {
    app.sessions = sessions;
    if app.sessions.iter().any(|s| s.status.is_active()) {
        app.ensure_session_poll();
    }
}

fn viewed(app: &mut App) -> Option<SessionInfo> {
    let session = app.viewed_session().cloned();
    if session.is_none() {
        app.toast(ToastLevel::Info, "No session selected");
    }
    session
}

pub(super) fn request_stop(app: &mut App) {
    let Some(session) = viewed(app) else { return };
    if session.status.is_terminal() {
        app.toast(
            ToastLevel::Info,
            format!("Session already {}", session.status.label()),
        );
        return;
    }
    let prompt = ConfirmPrompt::new(
        format!("Stop {}?", session.title()),
        &[('y', "stop session")],
    );
    app.show_confirm(ConfirmRequest::new(
        prompt,
        PendingAction::StopSession { id: session.id },
    ));
}

pub(super) fn stop(app: &mut App, id: String) {
    app.emit(Effect::StopSession { id });
}

pub(super) fn open_follow_up(app: &mut App) {
    let Some(session) = viewed(app) else { return };
    if session.status.is_active() {
        app.toast(ToastLevel::Info, "Session is still working; wait for it to go idle");
        return;
    }
    if session.status.is_terminal() {
        app.toast(
            ToastLevel::Info,
            format!("Session is {}; start a new one", session.status.label()),
        );
        return;
    }
    keys::open_input(
        app,
        InputPurpose::FollowUp {
            session_id: session.id,
        },
    );
}

pub(super) fn send_follow_up(app: &mut App, id: String, text: String) {
    app.emit(Effect::SendFollowUp { id, text });
}

/// Complete an idle planner and start a builder on its plan in the same
/// worktree.
pub(super) fn promote_plan(app: &mut App) {
    let Some(session) = viewed(app) else { return };
    if session.kind != SessionKind::Planner || session.status != SessionStatus::Idle {
        app.toast(
            ToastLevel::Info,
            "Only an idle planner can be promoted to a builder",
        );
        return;
    }
    if !provider_ready(app) {
        return;
    }
    info!(session = %session.id, "promoting plan to builder");
    app.emit(Effect::CompleteSession {
        id: session.id.clone(),
    });
    start_session(
        app,
        SessionKind::Builder,
        session.worktree_path.clone(),
        build_builder_from_plan_prompt(&session.prompt),
    );
}

pub(super) fn on_action_finished(
    app: &mut App,
    action: SessionAction,
    id: String,
    result: Result<(), String>,
) {
    match result {
        Ok(()) => {
            info!(session = %id, action = action.label(), "session action done");
            match action {
                SessionAction::Stop => app.toast(ToastLevel::Success, "Session stopped"),
                SessionAction::FollowUp => app.ensure_session_poll(),
                SessionAction::Complete => {}
            }
        }
        Err(e) => {
            warn!(session = %id, action = action.label(), error = %e, "session action failed");
            app.toast(
                ToastLevel::Error,
                format!("{} failed: {}", action.label(), e),
            );
        }
    }
    app.emit(Effect::LoadSessions);
}

/// `1`-`9`: view the n-th session of the selected worktree.
pub(super) fn quick_switch(app: &mut App, index: usize) {
    let id = app.sessions_for_selected().get(index).map(|s| s.id.clone());
    match id {
        Some(id) => app.view_mut().switch_to(Some(id)),
        None => app.toast(ToastLevel::Info, format!("No session {}", index + 1)),
    }
}
