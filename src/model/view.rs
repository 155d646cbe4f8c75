use std::collections::HashMap;

/// Which session a pane is showing, plus remembered scroll offsets for
/// every session that has been viewed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionViewState {
    pub viewing: Option<String>,
    pub scroll: usize,
    offsets: HashMap<String, usize>,
}

impl SessionViewState {
    /// Switch to `session_id`, saving the outgoing offset first and
    /// restoring the incoming one (0 when never seen).
    pub fn switch_to(&mut self, session_id: Option<String>) {
        if self.viewing == session_id {
            return;
        }
        if let Some(current) = self.viewing.take() {
            self.offsets.insert(current, self.scroll);
        }
        self.scroll = session_id
            .as_ref()
            .and_then(|id| self.offsets.get(id).copied())
            .unwrap_or(0);
        self.viewing = session_id;
    }

    /// Forget the viewed session without touching stored offsets.
    pub fn clear(&mut self) {
        if let Some(current) = self.viewing.take() {
            self.offsets.insert(current, self.scroll);
        }
        self.scroll = 0;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize, max: usize) {
        self.scroll = (self.scroll + lines).min(max);
    }

    #[cfg(test)]
    pub fn saved_offset(&self, session_id: &str) -> Option<usize> {
        self.offsets.get(session_id).copied()
    }
}
