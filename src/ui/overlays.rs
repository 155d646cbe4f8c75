use chrono::Local;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use super::theme::{Theme, THEME_NAMES};
use super::util::{centered, fit_width};
use crate::app::{App, HookField};
use crate::model::focus::FocusMode;

fn popup_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(theme.border_active())
}

fn draw_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem<'static>>,
    selected: usize,
    theme: &Theme,
) {
    f.render_widget(Clear, area);
    let mut state = ListState::default();
    state.select(Some(selected));
    let list = List::new(items)
        .block(popup_block(title, theme))
        .highlight_style(theme.list_selected())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

pub fn draw_dropdown(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let (title, items): (&str, Vec<ListItem>) = match app.focus {
        FocusMode::WorktreeDropdown => (
            "Worktrees",
            app.worktrees
                .iter()
                .map(|wt| {
                    let label = if wt.is_main {
                        format!("{} (main)", wt.name())
                    } else {
                        wt.name().to_string()
                    };
                    ListItem::new(Line::from(Span::styled(label, theme.branch())))
                })
                .collect(),
        ),
        _ => (
            "Sessions",
            app.sessions_for_selected()
                .iter()
                .map(|s| {
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{} ", s.status.icon())),
                        Span::styled(fit_width(&s.title(), 50), theme.desc()),
                    ]))
                })
                .collect(),
        ),
    };
    let height = (items.len() as u16 + 2).clamp(3, 20);
    let popup = centered(area, 60, height);
    draw_list(f, popup, title, items, app.dropdown_index, theme);
}

pub fn draw_confirm(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(request) = app.confirm.as_ref() else {
        return;
    };
    let popup = centered(area, 70, 6);
    f.render_widget(Clear, popup);

    let mut options = vec![Span::raw("  ")];
    for (key, label) in &request.prompt.options {
        options.push(Span::styled(key.to_string(), theme.key()));
        options.push(Span::styled(format!(" {}   ", label), theme.desc()));
    }
    options.push(Span::styled("Esc", theme.key()));
    options.push(Span::styled(" cancel", theme.desc()));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", request.prompt.message),
            theme.warning(),
        )),
        Line::from(""),
        Line::from(options),
    ];
    let paragraph = Paragraph::new(lines)
        .block(popup_block("Confirm", theme))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup);
}

pub fn draw_theme_picker(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let items = THEME_NAMES
        .iter()
        .map(|name| {
            let marker = if *name == app.settings.theme { " *" } else { "" };
            ListItem::new(format!("{}{}", name, marker))
        })
        .collect();
    let popup = centered(area, 30, THEME_NAMES.len() as u16 + 2);
    draw_list(f, popup, "Theme", items, app.theme_index, theme);
}

pub fn draw_repo_settings(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(editor) = app.repo_settings.as_ref() else {
        return;
    };
    let popup = centered(area, 90, 20);
    f.render_widget(Clear, popup);
    let outer = popup_block(&format!("Hooks for {}", app.repo_name), theme);
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
            Constraint::Length(1),
        ])
        .split(inner);

    let fields = [
        (&editor.create, HookField::Create, " on_worktree_create (one command per line) "),
        (&editor.delete, HookField::Delete, " on_worktree_delete (one command per line) "),
    ];
    for (i, (textarea, field, title)) in fields.into_iter().enumerate() {
        let active = editor.field == field;
        let mut clone = textarea.clone();
        clone.set_block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(if active {
                    theme.border_active()
                } else {
                    theme.border_inactive()
                }),
        );
        clone.set_style(theme.desc());
        clone.set_cursor_line_style(Style::default());
        if !active {
            clone.set_cursor_style(Style::default());
        }
        f.render_widget(&clone, chunks[i]);
    }

    let hints = Line::from(vec![
        Span::styled(" Tab", theme.key()),
        Span::styled(": switch  ", theme.desc()),
        Span::styled("Ctrl+S", theme.key()),
        Span::styled(": save  ", theme.desc()),
        Span::styled("Esc", theme.key()),
        Span::styled(": cancel", theme.desc()),
    ]);
    f.render_widget(Paragraph::new(hints), chunks[2]);
}

pub fn draw_all_sessions(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let now = Local::now();
    let items = app
        .sessions
        .iter()
        .map(|s| {
            let worktree = app
                .worktree_for_path(&s.worktree_path)
                .map(|wt| wt.name().to_string())
                .unwrap_or_else(|| s.worktree_path.display().to_string());
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", s.status.icon())),
                Span::styled(format!("{:<20} ", fit_width(&worktree, 20)), theme.branch()),
                Span::styled(fit_width(&s.title(), 40), theme.desc()),
                Span::styled(format!("  {}", s.age_label(now)), theme.muted()),
            ]))
        })
        .collect();
    let height = (app.sessions.len() as u16 + 2).clamp(3, 24);
    let popup = centered(area, 90, height);
    draw_list(f, popup, "All sessions", items, app.all_sessions_index, theme);
}
