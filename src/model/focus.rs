/// What owns the keyboard right now. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusMode {
    #[default]
    Output,
    WorktreeDropdown,
    SessionDropdown,
    Input,
    Confirm,
    Help,
    ThemePicker,
    RepoSettings,
    AllSessions,
    TaskModal,
}

impl FocusMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Output => "OUTPUT",
            Self::WorktreeDropdown => "WORKTREES",
            Self::SessionDropdown => "SESSIONS",
            Self::Input => "INPUT",
            Self::Confirm => "CONFIRM",
            Self::Help => "HELP",
            Self::ThemePicker => "THEME",
            Self::RepoSettings => "SETTINGS",
            Self::AllSessions => "ALL SESSIONS",
            Self::TaskModal => "TASK",
        }
    }
}

/// Which half of the split layout has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Left,
    Right,
}

impl Pane {
    pub fn other(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}
