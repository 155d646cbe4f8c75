use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::theme::Theme;
use super::util::centered;

const BINDINGS: &[(&str, &str)] = &[
    ("w / v", "Worktree / session dropdown"),
    ("n", "New worktree"),
    ("N", "Route a task to a worktree"),
    ("p / b", "Start planner / builder"),
    ("f", "Follow-up to an idle session"),
    ("a", "Promote idle plan to a builder"),
    ("s", "Stop viewed session"),
    ("1-9", "View n-th session of worktree"),
    ("j/k  PgUp/PgDn", "Scroll output"),
    ("Home / End", "Top / bottom of output"),
    ("F2 / Tab", "Toggle split / switch pane"),
    ("m", "Merge PR of selected worktree"),
    ("d", "Delete selected worktree"),
    ("g / G", "Sync selected / all worktrees"),
    ("r", "Refresh"),
    ("t / e", "tmux window / editor"),
    ("T / R", "Theme / repo hooks"),
    ("Ctrl+L", "All sessions"),
    ("?", "Toggle this help"),
    ("q / Ctrl+C", "Quit"),
];

pub fn draw_help(f: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered(area, 60, BINDINGS.len() as u16 + 4);

    // Clear background
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(" Keybindings", theme.title())),
        Line::from(""),
    ];

    for (key, desc) in BINDINGS {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:18}", key), theme.key()),
            Span::styled(*desc, theme.desc()),
        ]));
    }

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(theme.border_active());

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, popup_area);
}
