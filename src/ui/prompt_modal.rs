use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tui_textarea::TextArea;

use super::theme::Theme;
use super::util::centered;
use crate::app::{AdjustField, App, TaskStage};
use crate::model::routing::RoutingAction;

fn draw_editor(
    f: &mut Frame,
    area: Rect,
    editor: &TextArea<'static>,
    title: String,
    active: bool,
    theme: &Theme,
) {
    let border = if active {
        theme.border_active()
    } else {
        theme.border_inactive()
    };
    let mut editor_clone = editor.clone();
    editor_clone.set_block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border),
    );
    editor_clone.set_style(theme.desc());
    editor_clone.set_cursor_line_style(Style::default());
    if !active {
        editor_clone.set_cursor_style(Style::default());
    }
    f.render_widget(&editor_clone, area);
}

fn hint_line<'a>(hints: &[(&'a str, &'a str)], theme: &Theme) -> Line<'a> {
    let mut spans = Vec::new();
    for (key, desc) in hints {
        spans.push(Span::styled(format!(" {}", key), theme.key()));
        spans.push(Span::styled(format!(": {} ", desc), theme.desc()));
    }
    Line::from(spans)
}

/// Single-purpose text input: branch name, session prompt or follow-up.
pub fn draw_input(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(input) = app.input.as_ref() else {
        return;
    };
    let popup = centered(area, 80, 10);
    f.render_widget(Clear, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(popup);

    draw_editor(
        f,
        chunks[0],
        &input.editor,
        format!(" {} ", input.purpose.title()),
        true,
        theme,
    );
    f.render_widget(
        Paragraph::new(hint_line(&[("Enter", "submit"), ("Esc", "cancel")], theme)),
        chunks[1],
    );
}

/// The routed-task modal, drawn according to its stage.
pub fn draw_task_modal(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(modal) = app.task_modal.as_ref() else {
        return;
    };
    let popup = centered(area, 90, 16);
    f.render_widget(Clear, popup);

    let outer = Block::default()
        .title(" New task ")
        .borders(Borders::ALL)
        .border_style(theme.border_active());
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1), // error
            Constraint::Length(1), // hints
        ])
        .split(inner);

    let hints: &[(&str, &str)] = match &modal.stage {
        TaskStage::Prompt => {
            draw_editor(
                f,
                chunks[0],
                &modal.prompt,
                " Describe the task ".to_string(),
                true,
                theme,
            );
            &[("Enter", "route"), ("Esc", "cancel")]
        }
        TaskStage::Routing => {
            let text = Paragraph::new(vec![
                Line::from(Span::styled(modal.prompt_text(), theme.muted())),
                Line::from(""),
                Line::from(Span::styled("Routing task...", theme.warning())),
            ])
            .wrap(Wrap { trim: false });
            f.render_widget(text, chunks[0]);
            &[("Esc", "cancel")]
        }
        TaskStage::Proposal(proposal) => {
            let mut lines = vec![
                Line::from(Span::styled(proposal.summary(), theme.title())),
                Line::from(""),
            ];
            if !proposal.reasoning.is_empty() {
                lines.push(Line::from(Span::styled(
                    proposal.reasoning.clone(),
                    theme.desc(),
                )));
            }
            f.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: false }),
                chunks[0],
            );
            if proposal.action == RoutingAction::CreateNew {
                &[("Enter", "accept"), ("e", "adjust"), ("Esc", "cancel")]
            } else {
                &[("Enter", "accept"), ("Esc", "cancel")]
            }
        }
        TaskStage::Adjust(_) => {
            let fields = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
                .split(chunks[0]);
            draw_editor(
                f,
                fields[0],
                &modal.worktree,
                " Worktree branch ".to_string(),
                modal.field == AdjustField::Worktree,
                theme,
            );
            draw_editor(
                f,
                fields[1],
                &modal.parent,
                " Parent branch (empty = default) ".to_string(),
                modal.field == AdjustField::Parent,
                theme,
            );
            &[("Tab", "field"), ("Enter", "create"), ("Esc", "cancel")]
        }
    };

    if let Some(error) = &modal.error {
        f.render_widget(
            Paragraph::new(Span::styled(error.clone(), theme.error())),
            chunks[1],
        );
    }
    f.render_widget(Paragraph::new(hint_line(hints, theme)), chunks[2]);
}
