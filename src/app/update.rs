use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};

use super::{keys, merge_flow, overlays, routing_flow, session_flow, worktree_flow, App};
use crate::effect::{Effect, Timer};
use crate::model::confirm::{ConfirmOutcome, PendingAction};
use crate::model::focus::FocusMode;
use crate::model::toast::{ToastLevel, TOAST_TICK};
use crate::event::AppEvent;

/// Advance `app` by one event and return the deferred work it requested.
pub fn update(app: &mut App, event: AppEvent) -> Vec<Effect> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::TimerFired(timer, now) => handle_timer(app, timer, now),
        AppEvent::WorktreesLoaded(result) => worktree_flow::on_worktrees_loaded(app, result),
        AppEvent::GitStatusesLoaded(summaries) => {
            for (name, summary) in summaries {
                app.statuses.entry(name).or_default().git = Some(summary);
            }
        }
        AppEvent::PrStatusesLoaded(Ok(prs)) => {
            let branches: Vec<(String, String)> = app
                .worktrees
                .iter()
                .map(|wt| (wt.name().to_string(), wt.branch.clone()))
                .collect();
            for (name, branch) in branches {
                app.statuses.entry(name).or_default().pr = prs.get(&branch).cloned();
            }
            app.prs_loaded = true;
        }
        AppEvent::PrStatusesLoaded(Err(e)) => {
            // Polled every minute; a toast each time would be noise.
            warn!(error = %e, "PR status refresh failed");
        }
        AppEvent::WorktreeOpFinished {
            kind,
            target,
            auto_prompt,
            result,
        } => worktree_flow::on_op_finished(app, kind, target, auto_prompt, result),
        AppEvent::MergeFinished {
            branch,
            result,
            lines,
        } => merge_flow::on_merge_finished(app, branch, result, lines),
        AppEvent::SessionStarted {
            kind,
            worktree_path,
            result,
        } => session_flow::on_started(app, kind, worktree_path, result),
        AppEvent::SessionsLoaded(sessions) => session_flow::on_sessions_loaded(app, sessions),
        AppEvent::SessionActionFinished { action, id, result } => {
            session_flow::on_action_finished(app, action, id, result)
        }
        AppEvent::RoutingFinished { request, result } => {
            routing_flow::on_routing_finished(app, request, result)
        }
        AppEvent::SettingsSaved(result) => overlays::on_settings_saved(app, result),
        AppEvent::SettingsLoaded(result) => overlays::on_settings_loaded(app, result),
        AppEvent::ExternalFinished { label, result } => match result {
            Ok(()) => {
                info!(%label, "external command finished");
                app.toast(ToastLevel::Success, format!("Opened {}", label));
            }
            Err(e) => {
                warn!(%label, error = %e, "external command failed");
                app.toast(ToastLevel::Error, format!("{} failed: {}", label, e));
            }
        },
        AppEvent::GitChanged => {
            debug!("git metadata changed");
            let targets = app.git_status_targets();
            app.emit(Effect::LoadGitStatuses(targets));
        }
        AppEvent::SettingsChanged => app.emit(Effect::ReloadSettings),
    }
    app.show_deferred_confirm();
    app.take_effects()
}

fn handle_timer(app: &mut App, timer: Timer, now: Instant) {
    match timer {
        Timer::ToastExpiry => {
            if app.toasts.tick(now) {
                app.emit(Effect::Schedule {
                    after: TOAST_TICK,
                    timer: Timer::ToastExpiry,
                });
            }
        }
        // The status polls reschedule unconditionally, whether or not the
        // previous fetch has come back.
        Timer::GitStatusPoll => {
            let targets = app.git_status_targets();
            app.emit(Effect::LoadGitStatuses(targets));
            app.emit(Effect::Schedule {
                after: Duration::from_secs(app.config.git_status_secs()),
                timer: Timer::GitStatusPoll,
            });
        }
        Timer::PrStatusPoll => {
            app.emit(Effect::LoadPrStatuses);
            app.emit(Effect::Schedule {
                after: Duration::from_secs(app.config.pr_status_secs()),
                timer: Timer::PrStatusPoll,
            });
        }
        Timer::SessionPoll => {
            app.session_poll_scheduled = false;
            app.emit(Effect::LoadSessions);
        }
    }
}

/// Route a keystroke to the layer that owns the keyboard. Each layer either
/// consumes the key or is inactive; nothing falls through.
fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        info!("quit requested");
        app.emit(Effect::Quit);
        return;
    }

    match app.focus {
        FocusMode::Help => overlays::help_key(app, key),
        FocusMode::ThemePicker => overlays::theme_picker_key(app, key),
        FocusMode::RepoSettings => overlays::repo_settings_key(app, key),
        FocusMode::AllSessions => overlays::all_sessions_key(app, key),
        FocusMode::Confirm => confirm_key(app, key),
        FocusMode::TaskModal => routing_flow::task_modal_key(app, key),
        FocusMode::Input => keys::input_key(app, key),
        FocusMode::WorktreeDropdown | FocusMode::SessionDropdown => keys::dropdown_key(app, key),
        FocusMode::Output if app.pending_quit => pending_quit_key(app, key),
        FocusMode::Output => keys::normal_key(app, key),
    }
}

fn pending_quit_key(app: &mut App, key: KeyEvent) {
    app.pending_quit = false;
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('y') => {
            info!("quit confirmed with sessions still running");
            app.emit(Effect::Quit);
        }
        _ => app.toast(ToastLevel::Info, "Quit cancelled"),
    }
}

fn confirm_key(app: &mut App, key: KeyEvent) {
    let Some(outcome) = app.confirm.as_ref().map(|c| c.prompt.handle_key(&key)) else {
        // Focus says Confirm but nothing is open; recover to the resting mode.
        app.set_focus(FocusMode::Output);
        return;
    };

    match outcome {
        ConfirmOutcome::Ignored => {}
        ConfirmOutcome::Quit => {
            app.close_confirm();
            app.emit(Effect::Quit);
        }
        ConfirmOutcome::Cancelled => {
            if let Some(request) = app.close_confirm() {
                debug!(action = ?request.on_confirm, "confirmation cancelled");
                if let Some(action) = request.on_cancel {
                    run_pending_action(app, action, None);
                }
            }
        }
        ConfirmOutcome::Matched(choice) => {
            if let Some(request) = app.close_confirm() {
                run_pending_action(app, request.on_confirm, Some(choice));
            }
        }
    }
}

/// Carry out a confirmed (or cancel-bound) action. `choice` is the option
/// key pressed, `None` when running as a cancel handler.
fn run_pending_action(app: &mut App, action: PendingAction, choice: Option<char>) {
    debug!(?action, ?choice, "run pending action");
    match action {
        PendingAction::DeleteWorktree { branch, path } => {
            let delete_branch = choice == Some('d');
            worktree_flow::start_delete(app, branch, path, delete_branch);
        }
        PendingAction::StopSession { id } => session_flow::stop(app, id),
        PendingAction::MergePr { branch, pr_number } => {
            if let Some(method) = choice.and_then(crate::model::confirm::MergeMethod::from_key) {
                merge_flow::start_merge(app, branch, pr_number, method);
            }
        }
        PendingAction::PostMerge { branch, path } => {
            merge_flow::post_merge_choice(app, choice, branch, path)
        }
        PendingAction::KeepMergedWorktree { branch } => merge_flow::keep(app, &branch),
    }
}
