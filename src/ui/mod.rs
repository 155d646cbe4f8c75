pub mod help_overlay;
pub mod layout;
pub mod overlays;
pub mod prompt_modal;
pub mod sessions_view;
pub mod theme;
pub mod util;
pub mod worktree_view;

use ratatui::Frame;

use crate::app::App;

/// Main draw dispatcher.
pub fn draw(f: &mut Frame, app: &App) {
    layout::draw_layout(f, app);
}
