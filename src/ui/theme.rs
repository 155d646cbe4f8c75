use ratatui::style::{Color, Modifier, Style};

/// Built-in theme names, in picker order.
pub const THEME_NAMES: &[&str] = &["default", "gruvbox", "nord", "mono"];

/// Palette every view draws with. Pick one with [`theme_by_name`].
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub bar_bg: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight_bg: Color,
}

const DEFAULT: Theme = Theme {
    accent: Color::Cyan,
    text: Color::White,
    muted: Color::DarkGray,
    bar_bg: Color::DarkGray,
    success: Color::Green,
    warning: Color::Yellow,
    error: Color::Red,
    highlight_bg: Color::DarkGray,
};

const GRUVBOX: Theme = Theme {
    accent: Color::Rgb(250, 189, 47),
    text: Color::Rgb(235, 219, 178),
    muted: Color::Rgb(146, 131, 116),
    bar_bg: Color::Rgb(60, 56, 54),
    success: Color::Rgb(184, 187, 38),
    warning: Color::Rgb(254, 128, 25),
    error: Color::Rgb(251, 73, 52),
    highlight_bg: Color::Rgb(80, 73, 69),
};

const NORD: Theme = Theme {
    accent: Color::Rgb(136, 192, 208),
    text: Color::Rgb(236, 239, 244),
    muted: Color::Rgb(97, 110, 136),
    bar_bg: Color::Rgb(59, 66, 82),
    success: Color::Rgb(163, 190, 140),
    warning: Color::Rgb(235, 203, 139),
    error: Color::Rgb(191, 97, 106),
    highlight_bg: Color::Rgb(67, 76, 94),
};

const MONO: Theme = Theme {
    accent: Color::White,
    text: Color::Gray,
    muted: Color::DarkGray,
    bar_bg: Color::Black,
    success: Color::White,
    warning: Color::White,
    error: Color::White,
    highlight_bg: Color::DarkGray,
};

/// Unknown names fall back to the default palette.
pub fn theme_by_name(name: &str) -> Theme {
    match name {
        "gruvbox" => GRUVBOX,
        "nord" => NORD,
        "mono" => MONO,
        _ => DEFAULT,
    }
}

impl Theme {
    pub fn status_bar(&self) -> Style {
        Style::new().fg(self.text).bg(self.bar_bg)
    }

    pub fn list_selected(&self) -> Style {
        Style::new()
            .fg(self.text)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_active(&self) -> Style {
        Style::new().fg(self.accent)
    }

    pub fn border_inactive(&self) -> Style {
        Style::new().fg(self.muted)
    }

    pub fn title(&self) -> Style {
        Style::new().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn key(&self) -> Style {
        Style::new().fg(self.warning).add_modifier(Modifier::BOLD)
    }

    pub fn desc(&self) -> Style {
        Style::new().fg(self.text)
    }

    pub fn hint_key(&self) -> Style {
        Style::new().fg(self.warning).bg(self.bar_bg)
    }

    pub fn hint_desc(&self) -> Style {
        Style::new().fg(self.muted).bg(self.bar_bg)
    }

    pub fn empty(&self) -> Style {
        Style::new().fg(self.muted)
    }

    pub fn branch(&self) -> Style {
        Style::new().fg(self.warning)
    }

    pub fn success(&self) -> Style {
        Style::new().fg(self.success)
    }

    pub fn warning(&self) -> Style {
        Style::new().fg(self.warning)
    }

    pub fn error(&self) -> Style {
        Style::new().fg(self.error)
    }

    pub fn muted(&self) -> Style {
        Style::new().fg(self.muted)
    }

    pub fn focus_badge(&self) -> Style {
        Style::new()
            .fg(Color::Black)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}
