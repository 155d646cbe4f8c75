use chrono::Local;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::theme::Theme;
use super::util::fit_width;
use crate::app::App;
use crate::model::focus::Pane;
use crate::model::session::SessionStatus;
use crate::model::view::SessionViewState;

/// The session output area: one pane, or two side by side when split.
pub fn draw_panes(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    if !app.split {
        draw_pane(f, area, app, &app.panes[0], true, theme);
        return;
    }
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    draw_pane(
        f,
        halves[0],
        app,
        &app.panes[0],
        app.active_pane == Pane::Left,
        theme,
    );
    draw_pane(
        f,
        halves[1],
        app,
        &app.panes[1],
        app.active_pane == Pane::Right,
        theme,
    );
}

fn status_style(status: SessionStatus, theme: &Theme) -> ratatui::style::Style {
    match status {
        SessionStatus::Running | SessionStatus::Pending => theme.success(),
        SessionStatus::Idle => theme.warning(),
        SessionStatus::Failed => theme.error(),
        SessionStatus::Completed | SessionStatus::Stopped => theme.muted(),
    }
}

fn draw_pane(
    f: &mut Frame,
    area: Rect,
    app: &App,
    view: &SessionViewState,
    active: bool,
    theme: &Theme,
) {
    let border_style = if active {
        theme.border_active()
    } else {
        theme.border_inactive()
    };
    let session = view.viewing.as_deref().and_then(|id| app.session(id));

    let Some(session) = session else {
        let block = Block::default()
            .title(" Session ")
            .borders(Borders::ALL)
            .border_style(border_style);
        let hint = if app.selected.is_some() {
            "No session. p: start planner, b: start builder, N: route a task"
        } else {
            "Select a worktree with w"
        };
        f.render_widget(Paragraph::new(hint).style(theme.empty()).block(block), area);
        return;
    };

    let width = area.width.saturating_sub(2) as usize;
    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            session.status.icon(),
            status_style(session.status, theme),
        ),
        Span::raw(" "),
        Span::styled(
            fit_width(&session.title(), width.saturating_sub(30)),
            theme.title(),
        ),
        Span::styled(
            format!(
                "  {} {} {} ",
                session.model,
                session.status.label(),
                session.age_label(Local::now())
            ),
            theme.muted(),
        ),
    ]);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if session.output.is_empty() {
        let msg = match session.status {
            SessionStatus::Pending | SessionStatus::Running => "Waiting for output...",
            _ => "(no output)",
        };
        f.render_widget(Paragraph::new(msg).style(theme.empty()), inner);
        return;
    }

    let height = inner.height as usize;
    let total = session.output.len();
    let start = view.scroll.min(total.saturating_sub(1));
    let end = (start + height).min(total);
    let lines: Vec<Line> = session.output[start..end]
        .iter()
        .map(|line| {
            let style = if line.starts_with("! ") {
                theme.error()
            } else if line.starts_with("> ") {
                theme.muted()
            } else {
                theme.desc()
            };
            Line::from(Span::styled(fit_width(line, width), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}
