use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single-keystroke decision widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmPrompt {
    pub message: String,
    pub options: Vec<(char, String)>,
}

/// Result of feeding one keystroke to an open prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Matched(char),
    Cancelled,
    Quit,
    /// Unrecognised key: the prompt stays open and nothing fires.
    Ignored,
}

impl ConfirmPrompt {
    pub fn new(message: impl Into<String>, options: &[(char, &str)]) -> Self {
        Self {
            message: message.into(),
            options: options
                .iter()
                .map(|(key, label)| (*key, (*label).to_string()))
                .collect(),
        }
    }

    pub fn handle_key(&self, key: &KeyEvent) -> ConfirmOutcome {
        match key.code {
            KeyCode::Esc => ConfirmOutcome::Cancelled,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                ConfirmOutcome::Quit
            }
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && self.options.iter().any(|(k, _)| *k == c) =>
            {
                ConfirmOutcome::Matched(c)
            }
            _ => ConfirmOutcome::Ignored,
        }
    }
}

/// How `gh pr merge` should land the pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    Squash,
    Rebase,
    Merge,
}

impl MergeMethod {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            's' => Some(Self::Squash),
            'r' => Some(Self::Rebase),
            'm' => Some(Self::Merge),
            _ => None,
        }
    }

    pub fn gh_flag(&self) -> &'static str {
        match self {
            Self::Squash => "--squash",
            Self::Rebase => "--rebase",
            Self::Merge => "--merge",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Squash => "squash",
            Self::Rebase => "rebase",
            Self::Merge => "merge commit",
        }
    }
}

/// The follow-up bound to a confirmation prompt. Each variant carries just
/// enough data to rebuild the command once the user answers.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    DeleteWorktree { branch: String, path: PathBuf },
    StopSession { id: String },
    MergePr { branch: String, pr_number: u64 },
    PostMerge { branch: String, path: PathBuf },
    KeepMergedWorktree { branch: String },
}

/// An open prompt together with its confirm and (optional) cancel actions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmRequest {
    pub prompt: ConfirmPrompt,
    pub on_confirm: PendingAction,
    pub on_cancel: Option<PendingAction>,
}

impl ConfirmRequest {
    pub fn new(prompt: ConfirmPrompt, on_confirm: PendingAction) -> Self {
        Self {
            prompt,
            on_confirm,
            on_cancel: None,
        }
    }

    pub fn with_cancel(mut self, action: PendingAction) -> Self {
        self.on_cancel = Some(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn prompt() -> ConfirmPrompt {
        ConfirmPrompt::new("Delete?", &[('k', "keep branch"), ('d', "delete branch")])
    }

    #[test]
    fn matching_key_is_reported() {
        assert_eq!(
            prompt().handle_key(&key(KeyCode::Char('d'))),
            ConfirmOutcome::Matched('d')
        );
    }

    #[test]
    fn esc_cancels_and_ctrl_c_quits() {
        assert_eq!(prompt().handle_key(&key(KeyCode::Esc)), ConfirmOutcome::Cancelled);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(prompt().handle_key(&ctrl_c), ConfirmOutcome::Quit);
    }

    #[test]
    fn unknown_keys_are_inert() {
        for code in [KeyCode::Char('x'), KeyCode::Char('n'), KeyCode::Enter, KeyCode::Tab] {
            assert_eq!(prompt().handle_key(&key(code)), ConfirmOutcome::Ignored);
        }
    }

    #[test]
    fn merge_method_keys() {
        assert_eq!(MergeMethod::from_key('s'), Some(MergeMethod::Squash));
        assert_eq!(MergeMethod::from_key('r'), Some(MergeMethod::Rebase));
        assert_eq!(MergeMethod::from_key('m'), Some(MergeMethod::Merge));
        assert_eq!(MergeMethod::from_key('x'), None);
    }
}
