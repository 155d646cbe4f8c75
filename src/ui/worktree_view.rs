use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::theme::Theme;
use super::util::fit_width;
use crate::app::App;
use crate::model::worktree::Worktree;

pub fn draw_worktrees(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let block = Block::default()
        .title(format!(" Worktrees [{}] ", app.worktrees.len()))
        .borders(Borders::ALL)
        .border_style(theme.border_active());

    if app.worktrees.is_empty() {
        let msg = Paragraph::new("Loading worktrees...")
            .style(theme.empty())
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .worktrees
        .iter()
        .map(|wt| ListItem::new(worktree_lines(app, wt, width, theme)))
        .collect();

    let selected = app
        .selected
        .as_deref()
        .and_then(|name| app.worktrees.iter().position(|wt| wt.name() == name));
    let mut state = ListState::default();
    state.select(selected);

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.list_selected());
    f.render_stateful_widget(list, area, &mut state);
}

/// Two lines per worktree: name with badges, then PR summary.
fn worktree_lines<'a>(app: &App, wt: &Worktree, width: usize, theme: &Theme) -> Vec<Line<'a>> {
    let mut first = vec![Span::styled(
        fit_width(wt.name(), width.saturating_sub(20)),
        theme.branch(),
    )];
    if wt.is_main {
        first.push(Span::styled(" (main)", theme.muted()));
    }
    if let Some(short) = wt.head.get(..7) {
        first.push(Span::styled(format!(" {}", short), theme.muted()));
    }

    let sessions = app.sessions_for_path(&wt.path);
    let active = sessions.iter().filter(|s| s.status.is_active()).count();
    if active > 0 {
        first.push(Span::styled(format!(" [>{}]", active), theme.success()));
    } else if !sessions.is_empty() {
        first.push(Span::styled(format!(" [{}]", sessions.len()), theme.muted()));
    }

    let status = app.status_of(wt.name());
    if let Some(badge) = status
        .and_then(|s| s.git.as_ref())
        .map(|g| g.badge())
        .filter(|b| !b.is_empty())
    {
        first.push(Span::styled(format!(" {}", badge), theme.warning()));
    }

    let second = match status.and_then(|s| s.pr.as_ref()) {
        Some(pr) => {
            let mut spans = vec![
                Span::raw("  "),
                Span::styled(format!("#{} {}", pr.number, pr.state), theme.muted()),
                Span::raw(" "),
                Span::styled(pr.review_icon(), theme.desc()),
            ];
            if pr.is_draft {
                spans.push(Span::styled(" draft", theme.muted()));
            }
            let used: usize = spans.iter().map(|s| s.width()).sum();
            spans.push(Span::styled(
                format!(" {}", fit_width(&pr.title, width.saturating_sub(used + 1))),
                theme.desc(),
            ));
            Line::from(spans)
        }
        None => Line::from(Span::styled("  no PR", theme.empty())),
    };

    vec![Line::from(first), second]
}
