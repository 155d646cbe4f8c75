use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};
use tui_textarea::TextArea;

use super::App;
use crate::config::{RepoHooks, Settings};
use crate::effect::Effect;
use crate::model::focus::FocusMode;
use crate::model::toast::ToastLevel;
use crate::ui::theme::THEME_NAMES;

pub(super) fn help_key(app: &mut App, key: KeyEvent) {
    if matches!(
        key.code,
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
    ) {
        app.set_focus(FocusMode::Output);
    }
}

// ---------------------------------------------------------------------------
// Theme picker
// ---------------------------------------------------------------------------

pub(super) fn open_theme_picker(app: &mut App) {
    app.theme_index = THEME_NAMES
        .iter()
        .position(|name| *name == app.settings.theme)
        .unwrap_or(0);
    app.set_focus(FocusMode::ThemePicker);
}

pub(super) fn theme_picker_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.set_focus(FocusMode::Output),
        KeyCode::Char('j') | KeyCode::Down => {
            app.theme_index = (app.theme_index + 1).min(THEME_NAMES.len() - 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.theme_index = app.theme_index.saturating_sub(1);
        }
        KeyCode::Enter => {
            let name = THEME_NAMES[app.theme_index.min(THEME_NAMES.len() - 1)];
            info!(theme = name, "theme selected");
            app.settings.theme = name.to_string();
            app.emit(Effect::SaveSettings(app.settings.clone()));
            app.set_focus(FocusMode::Output);
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Per-repo hook editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookField {
    Create,
    Delete,
}

/// Two multi-line editors, one hook command per line.
pub struct RepoSettingsEditor {
    pub create: TextArea<'static>,
    pub delete: TextArea<'static>,
    pub field: HookField,
}

impl RepoSettingsEditor {
    fn new(hooks: &RepoHooks) -> Self {
        Self {
            create: editor(&hooks.on_worktree_create),
            delete: editor(&hooks.on_worktree_delete),
            field: HookField::Create,
        }
    }

    fn active_mut(&mut self) -> &mut TextArea<'static> {
        match self.field {
            HookField::Create => &mut self.create,
            HookField::Delete => &mut self.delete,
        }
    }

    pub fn hooks(&self) -> RepoHooks {
        RepoHooks {
            on_worktree_create: commands(&self.create),
            on_worktree_delete: commands(&self.delete),
        }
    }
}

fn editor(lines: &[String]) -> TextArea<'static> {
    let mut editor = TextArea::new(if lines.is_empty() {
        vec![String::new()]
    } else {
        lines.to_vec()
    });
    editor.set_cursor_line_style(ratatui::style::Style::default());
    editor
}

fn commands(editor: &TextArea<'static>) -> Vec<String> {
    editor
        .lines()
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

pub(super) fn open_repo_settings(app: &mut App) {
    let hooks = app.settings.hooks_for(&app.repo_name);
    app.repo_settings = Some(RepoSettingsEditor::new(&hooks));
    app.set_focus(FocusMode::RepoSettings);
}

fn close_repo_settings(app: &mut App) {
    app.repo_settings = None;
    app.set_focus(FocusMode::Output);
}

pub(super) fn repo_settings_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => close_repo_settings(app),
        KeyCode::Char('s') if ctrl => {
            let Some(editor) = app.repo_settings.as_ref() else {
                close_repo_settings(app);
                return;
            };
            let hooks = editor.hooks();
            info!(
                repo = %app.repo_name,
                create = hooks.on_worktree_create.len(),
                delete = hooks.on_worktree_delete.len(),
                "repo hooks updated"
            );
            let repo = app.repo_name.clone();
            app.settings.set_hooks(&repo, hooks);
            app.emit(Effect::SaveSettings(app.settings.clone()));
            close_repo_settings(app);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(editor) = app.repo_settings.as_mut() {
                editor.field = match editor.field {
                    HookField::Create => HookField::Delete,
                    HookField::Delete => HookField::Create,
                };
            }
        }
        _ => match app.repo_settings.as_mut() {
            Some(editor) => {
                editor.active_mut().input(key);
            }
            None => app.set_focus(FocusMode::Output),
        },
    }
}

// ---------------------------------------------------------------------------
// All-sessions list
// ---------------------------------------------------------------------------

pub(super) fn open_all_sessions(app: &mut App) {
    if app.sessions.is_empty() {
        app.toast(ToastLevel::Info, "No sessions yet");
        return;
    }
    let viewing = app.view().viewing.clone();
    app.all_sessions_index = app
        .sessions
        .iter()
        .position(|s| Some(&s.id) == viewing.as_ref())
        .unwrap_or(0);
    app.set_focus(FocusMode::AllSessions);
}

pub(super) fn all_sessions_key(app: &mut App, key: KeyEvent) {
    let len = app.sessions.len();
    match key.code {
        KeyCode::Esc => app.set_focus(FocusMode::Output),
        KeyCode::Char('j') | KeyCode::Down => {
            if len > 0 {
                app.all_sessions_index = (app.all_sessions_index + 1).min(len - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.all_sessions_index = app.all_sessions_index.saturating_sub(1);
        }
        KeyCode::Enter => {
            let target = app
                .sessions
                .get(app.all_sessions_index)
                .map(|s| (s.id.clone(), s.worktree_path.clone()));
            app.set_focus(FocusMode::Output);
            let Some((id, path)) = target else { return };
            let Some(name) = app.worktree_for_path(&path).map(|wt| wt.name().to_string()) else {
                app.toast(
                    ToastLevel::Info,
                    format!("Worktree {} no longer exists", path.display()),
                );
                return;
            };
            app.select_worktree(&name);
            app.view_mut().switch_to(Some(id));
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Settings persistence results
// ---------------------------------------------------------------------------

pub(super) fn on_settings_saved(app: &mut App, result: Result<(), String>) {
    match result {
        Ok(()) => app.toast(ToastLevel::Success, "Settings saved"),
        Err(e) => {
            warn!(error = %e, "failed to save settings");
            app.toast(ToastLevel::Error, format!("Failed to save settings: {}", e));
        }
    }
}

/// The settings file changed on disk; adopt it unless it no longer parses.
pub(super) fn on_settings_loaded(app: &mut App, result: Result<Settings, String>) {
    match result {
        Ok(settings) => {
            if settings != app.settings {
                info!("settings reloaded from disk");
                app.settings = settings;
            }
        }
        Err(e) => {
            warn!(error = %e, "settings file could not be reloaded");
            app.toast(
                ToastLevel::Warning,
                format!("Settings file ignored: {}", e),
            );
        }
    }
}
