use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::theme::Theme;
use super::util::fit_width;
use super::{help_overlay, overlays, prompt_modal, sessions_view, worktree_view};
use crate::app::App;
use crate::model::focus::FocusMode;
use crate::model::toast::ToastLevel;

/// Lines of the op log kept on screen.
const OP_LOG_HEIGHT: u16 = 6;
const MAX_VISIBLE_TOASTS: usize = 3;

pub fn draw_layout(f: &mut Frame, app: &App) {
    let theme = app.theme();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app, &theme);
    draw_content(f, chunks[1], app, &theme);
    draw_status_bar(f, chunks[2], app, &theme);
    draw_toasts(f, chunks[1], app, &theme);

    match app.focus {
        FocusMode::WorktreeDropdown | FocusMode::SessionDropdown => {
            overlays::draw_dropdown(f, f.area(), app, &theme)
        }
        FocusMode::Input => prompt_modal::draw_input(f, f.area(), app, &theme),
        FocusMode::TaskModal => prompt_modal::draw_task_modal(f, f.area(), app, &theme),
        FocusMode::Confirm => overlays::draw_confirm(f, f.area(), app, &theme),
        FocusMode::ThemePicker => overlays::draw_theme_picker(f, f.area(), app, &theme),
        FocusMode::RepoSettings => overlays::draw_repo_settings(f, f.area(), app, &theme),
        FocusMode::AllSessions => overlays::draw_all_sessions(f, f.area(), app, &theme),
        FocusMode::Help => help_overlay::draw_help(f, f.area(), &theme),
        FocusMode::Output => {}
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut spans = vec![
        Span::styled(" arbor ", theme.focus_badge()),
        Span::styled(format!(" {} ", app.repo_name), theme.title()),
    ];
    if let Some(repo) = &app.gh_repo {
        spans.push(Span::styled(format!(" {} ", repo), theme.muted()));
    }
    if let Some(op) = app.op_in_flight {
        spans.push(Span::styled(
            format!(" {}… ", op.progressive()),
            theme.warning(),
        ));
    }
    if app.merge_in_flight {
        spans.push(Span::styled(" Merging… ", theme.warning()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_content(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    worktree_view::draw_worktrees(f, columns[0], app, theme);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(OP_LOG_HEIGHT)])
        .split(columns[1]);

    sessions_view::draw_panes(f, right[0], app, theme);
    draw_op_log(f, right[1], app, theme);
}

fn draw_op_log(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(theme.border_inactive());
    let inner_height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let start = app.op_log.len().saturating_sub(inner_height);
    let lines: Vec<Line> = app.op_log[start..]
        .iter()
        .map(|l| Line::from(Span::styled(fit_width(l, width), theme.muted())))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn hint_text(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.focus {
        FocusMode::Output if app.pending_quit => vec![("q/y", "quit"), ("any", "stay")],
        FocusMode::Output => vec![
            ("w", "worktree"),
            ("v", "session"),
            ("N", "task"),
            ("p/b", "plan/build"),
            ("m", "merge"),
            ("?", "help"),
        ],
        FocusMode::WorktreeDropdown | FocusMode::SessionDropdown => {
            vec![("j/k", "move"), ("Enter", "select"), ("Esc", "close")]
        }
        FocusMode::Input => vec![("Enter", "submit"), ("Esc", "cancel")],
        FocusMode::Confirm => vec![("Esc", "cancel")],
        FocusMode::Help => vec![("Esc", "close")],
        FocusMode::ThemePicker | FocusMode::AllSessions => {
            vec![("j/k", "move"), ("Enter", "select"), ("Esc", "close")]
        }
        FocusMode::RepoSettings => vec![("Tab", "field"), ("^S", "save"), ("Esc", "cancel")],
        FocusMode::TaskModal => vec![("Enter", "next"), ("Esc", "close")],
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut left_spans = vec![Span::styled(
        format!(" {} ", app.focus.label()),
        theme.focus_badge(),
    )];
    if app.split {
        let pane = match app.active_pane {
            crate::model::focus::Pane::Left => " SPLIT L ",
            crate::model::focus::Pane::Right => " SPLIT R ",
        };
        left_spans.push(Span::styled(pane, theme.status_bar()));
    }
    let running = app.non_terminal_sessions();
    if running > 0 {
        left_spans.push(Span::styled(
            format!(" {} live ", running),
            theme.status_bar(),
        ));
    }

    let hints = hint_text(app);
    let mut hint_spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            hint_spans.push(Span::styled("  ", theme.status_bar()));
        }
        hint_spans.push(Span::styled(*key, theme.hint_key()));
        hint_spans.push(Span::styled(":", theme.hint_desc()));
        hint_spans.push(Span::styled(*desc, theme.hint_desc()));
    }
    hint_spans.push(Span::styled(" ", theme.status_bar()));

    let left_width: usize = left_spans.iter().map(|s| s.width()).sum();
    let hint_width: usize = hint_spans.iter().map(|s| s.width()).sum();
    let total = area.width as usize;
    let gap = total.saturating_sub(left_width + hint_width);

    let mut spans = left_spans;
    spans.push(Span::styled(" ".repeat(gap), theme.status_bar()));
    spans.extend(hint_spans);

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Newest toasts stacked in the top-right corner of the content area.
fn draw_toasts(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let width = 50u16.min(area.width.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width + 1);
    for (i, toast) in app.toasts.iter().take(MAX_VISIBLE_TOASTS).enumerate() {
        let y = area.y + i as u16;
        if y >= area.y + area.height {
            break;
        }
        let rect = Rect::new(x, y, width, 1);
        let style = match toast.level {
            ToastLevel::Info => theme.status_bar(),
            ToastLevel::Success => theme.success().bg(theme.bar_bg),
            ToastLevel::Warning => theme.warning().bg(theme.bar_bg),
            ToastLevel::Error => theme.error().bg(theme.bar_bg),
        };
        let text = fit_width(
            &format!(" {} {} ", toast.level.icon(), toast.message),
            width as usize,
        );
        f.render_widget(Clear, rect);
        f.render_widget(Paragraph::new(Span::styled(text, style)), rect);
    }
}
