//! Transient user-visible notices (toasts).

#[cfg(test)]
#[path = "notice_test.rs"]
mod notice_test;

use crate::consts::NOTICE_TTL_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: NoticeKind::Success }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: NoticeKind::Error }
    }
}

/// Holds the notice currently on screen. A new notice replaces the old one.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    current: Option<(Notice, f64)>,
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, notice: Notice) {
        self.current = Some((notice, 0.0));
    }

    #[must_use]
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref().map(|(n, _)| n)
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Age the notice and drop it once it has been shown for its full lifetime.
    /// Returns `true` when a notice expired.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        let Some((_, age)) = self.current.as_mut() else {
            return false;
        };
        if dt_ms.is_finite() && dt_ms > 0.0 {
            *age += dt_ms;
        }
        if *age >= NOTICE_TTL_MS {
            self.current = None;
            return true;
        }
        false
    }
}

/// Abbreviate a transaction hash as `0x1234...abcd`.
#[must_use]
pub fn short_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() <= 10 {
        return hash.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
