use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::{merge_flow, overlays, routing_flow, session_flow, worktree_flow, App, InputPurpose, InputState};
use crate::effect::Effect;
use crate::model::focus::FocusMode;
use crate::model::session::SessionKind;
use crate::model::toast::ToastLevel;

const PAGE: usize = 20;

/// Normal-mode bindings: the lowest layer, reached only when nothing else
/// owns the keyboard.
pub(super) fn normal_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('l') if ctrl => overlays::open_all_sessions(app),
        KeyCode::Char('q') => request_quit(app),
        KeyCode::Char('?') => app.set_focus(FocusMode::Help),
        KeyCode::Char('w') => open_dropdown(app, FocusMode::WorktreeDropdown),
        KeyCode::Char('v') => open_dropdown(app, FocusMode::SessionDropdown),
        KeyCode::Char('n') => open_input(app, InputPurpose::NewWorktree),
        KeyCode::Char('N') => routing_flow::open(app),
        KeyCode::Char('p') => session_flow::open_prompt(app, SessionKind::Planner),
        KeyCode::Char('b') => session_flow::open_prompt(app, SessionKind::Builder),
        KeyCode::Char('f') => session_flow::open_follow_up(app),
        KeyCode::Char('a') => session_flow::promote_plan(app),
        KeyCode::Char('s') => session_flow::request_stop(app),
        KeyCode::Char('d') => worktree_flow::request_delete(app),
        KeyCode::Char('m') => merge_flow::request_merge(app),
        KeyCode::Char('g') => match app.selected.clone() {
            Some(branch) => worktree_flow::start_sync(app, Some(branch)),
            None => app.toast(ToastLevel::Info, "No worktree selected"),
        },
        KeyCode::Char('G') => worktree_flow::start_sync(app, None),
        KeyCode::Char('r') => refresh(app),
        KeyCode::Char('t') => open_external(app, false),
        KeyCode::Char('e') => open_external(app, true),
        KeyCode::Char('T') => overlays::open_theme_picker(app),
        KeyCode::Char('R') => overlays::open_repo_settings(app),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            session_flow::quick_switch(app, index);
        }
        KeyCode::F(2) => {
            app.split = !app.split;
            if !app.split {
                app.active_pane = crate::model::focus::Pane::Left;
            }
            debug!(split = app.split, "toggle split");
        }
        KeyCode::Tab if app.split => app.active_pane = app.active_pane.other(),
        KeyCode::Char('j') | KeyCode::Down => scroll(app, ScrollBy::Down(1)),
        KeyCode::Char('k') | KeyCode::Up => scroll(app, ScrollBy::Up(1)),
        KeyCode::PageDown => scroll(app, ScrollBy::Down(PAGE)),
        KeyCode::PageUp => scroll(app, ScrollBy::Up(PAGE)),
        KeyCode::Home => scroll(app, ScrollBy::Top),
        KeyCode::End => scroll(app, ScrollBy::Bottom),
        _ => {}
    }
}

fn request_quit(app: &mut App) {
    let running = app.non_terminal_sessions();
    if running == 0 {
        app.emit(Effect::Quit);
        return;
    }
    app.pending_quit = true;
    let noun = if running == 1 { "session is" } else { "sessions are" };
    app.toast(
        ToastLevel::Warning,
        format!(
            "{} {} still running. Press q or y to quit, any other key to stay",
            running, noun
        ),
    );
}

fn refresh(app: &mut App) {
    app.emit(Effect::LoadWorktrees);
    app.emit(Effect::LoadPrStatuses);
    app.emit(Effect::LoadSessions);
    app.toast(ToastLevel::Info, "Refreshing");
}

fn open_external(app: &mut App, editor: bool) {
    let Some(wt) = app.selected_worktree() else {
        app.toast(ToastLevel::Info, "No worktree selected");
        return;
    };
    let name = wt.name().to_string();
    let path = wt.path.clone();
    if editor {
        app.emit(Effect::OpenEditor { name, path });
    } else {
        app.emit(Effect::OpenTmuxWindow { name, path });
    }
}

enum ScrollBy {
    Up(usize),
    Down(usize),
    Top,
    Bottom,
}

fn scroll(app: &mut App, by: ScrollBy) {
    let max = app
        .viewed_session()
        .map(|s| s.output.len().saturating_sub(1))
        .unwrap_or(0);
    let view = app.view_mut();
    match by {
        ScrollBy::Up(n) => view.scroll_up(n),
        ScrollBy::Down(n) => view.scroll_down(n, max),
        ScrollBy::Top => view.scroll = 0,
        ScrollBy::Bottom => view.scroll = max,
    }
}

pub(super) fn open_input(app: &mut App, purpose: InputPurpose) {
    app.input = Some(InputState::new(purpose));
    app.set_focus(FocusMode::Input);
}

pub(super) fn input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input = None;
            app.set_focus(FocusMode::Output);
        }
        KeyCode::Enter => {
            let Some(input) = app.input.take() else {
                app.set_focus(FocusMode::Output);
                return;
            };
            app.set_focus(FocusMode::Output);
            let text = input.text();
            if text.is_empty() {
                return;
            }
            match input.purpose {
                InputPurpose::NewWorktree => {
                    worktree_flow::request_create(app, text, None, None);
                }
                InputPurpose::SessionPrompt { kind, path } => {
                    session_flow::start_session(app, kind, path, text);
                }
                InputPurpose::FollowUp { session_id } => {
                    session_flow::send_follow_up(app, session_id, text);
                }
            }
        }
        _ => {
            if let Some(input) = app.input.as_mut() {
                input.editor.input(key);
            }
        }
    }
}

fn open_dropdown(app: &mut App, mode: FocusMode) {
    if mode == FocusMode::SessionDropdown {
        if app.selected_worktree().is_none() {
            app.toast(ToastLevel::Info, "No worktree selected");
            return;
        }
        if app.sessions_for_selected().is_empty() {
            app.toast(ToastLevel::Info, "No sessions in this worktree");
            return;
        }
    }
    app.dropdown_index = match mode {
        FocusMode::WorktreeDropdown => app
            .selected
            .as_deref()
            .and_then(|name| app.worktrees.iter().position(|wt| wt.name() == name))
            .unwrap_or(0),
        _ => {
            let viewing = app.view().viewing.clone();
            app.sessions_for_selected()
                .iter()
                .position(|s| Some(&s.id) == viewing.as_ref())
                .unwrap_or(0)
        }
    };
    app.set_focus(mode);
}

fn dropdown_len(app: &App) -> usize {
    match app.focus {
        FocusMode::WorktreeDropdown => app.worktrees.len(),
        FocusMode::SessionDropdown => app.sessions_for_selected().len(),
        _ => 0,
    }
}

pub(super) fn dropdown_key(app: &mut App, key: KeyEvent) {
    let len = dropdown_len(app);
    match key.code {
        KeyCode::Esc => app.set_focus(FocusMode::Output),
        KeyCode::Char('j') | KeyCode::Down => {
            if len > 0 {
                app.dropdown_index = (app.dropdown_index + 1).min(len - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.dropdown_index = app.dropdown_index.saturating_sub(1);
        }
        KeyCode::Enter => {
            let index = app.dropdown_index;
            match app.focus {
                FocusMode::WorktreeDropdown => {
                    if let Some(name) = app.worktrees.get(index).map(|wt| wt.name().to_string()) {
                        app.select_worktree(&name);
                    }
                }
                FocusMode::SessionDropdown => {
                    let id = app.sessions_for_selected().get(index).map(|s| s.id.clone());
                    if let Some(id) = id {
                        app.view_mut().switch_to(Some(id));
                    }
                }
                _ => {}
            }
            app.set_focus(FocusMode::Output);
        }
        _ => {}
    }
}
