use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(4);

/// Interval of the expiry check while toasts are visible.
pub const TOAST_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Info => "[i]",
            Self::Success => "[+]",
            Self::Warning => "[!]",
            Self::Error => "[x]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub expires_at: Instant,
}

/// Ephemeral notifications, newest first.
///
/// The queue also tracks whether an expiry tick is outstanding so the
/// controller only schedules a timer while there is something to expire.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    tick_scheduled: bool,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a toast at the head. Returns `true` when the caller must
    /// schedule an expiry tick (none was outstanding).
    pub fn add(&mut self, message: impl Into<String>, level: ToastLevel, now: Instant) -> bool {
        self.toasts.push_front(Toast {
            level,
            message: message.into(),
            expires_at: now + TOAST_TTL,
        });
        if self.tick_scheduled {
            return false;
        }
        self.tick_scheduled = true;
        true
    }

    /// Drop every toast whose expiry is at or before `now`. Returns `true`
    /// when toasts remain and the tick must be rescheduled.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.toasts.retain(|t| t.expires_at > now);
        self.tick_scheduled = !self.toasts.is_empty();
        self.tick_scheduled
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.front()
    }

    #[cfg(test)]
    pub fn tick_scheduled(&self) -> bool {
        self.tick_scheduled
    }
}
