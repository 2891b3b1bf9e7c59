//! Transient user-visible notices.
//!
//! Only one notice is visible at a time; pushing a new one replaces the
//! current notice and restarts its display window.

use serde::{Deserialize, Serialize};

use crate::util::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Danger,
}

/// Display duration buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeDuration {
    Short,
    Medium,
    Long,
}

impl NoticeDuration {
    #[must_use]
    pub const fn millis(self) -> i64 {
        match self {
            Self::Short => 1_000,
            Self::Medium => 2_000,
            Self::Long => 3_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub duration: NoticeDuration,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>, duration: NoticeDuration) -> Self {
        Self {
            level,
            message: message.into(),
            duration,
        }
    }

    pub fn info(message: impl Into<String>, duration: NoticeDuration) -> Self {
        Self::new(NoticeLevel::Info, message, duration)
    }

    pub fn warning(message: impl Into<String>, duration: NoticeDuration) -> Self {
        Self::new(NoticeLevel::Warning, message, duration)
    }

    pub fn danger(message: impl Into<String>, duration: NoticeDuration) -> Self {
        Self::new(NoticeLevel::Danger, message, duration)
    }
}

#[derive(Debug, Clone)]
struct Shown {
    notice: Notice,
    shown_at_ms: i64,
}

/// Holds the currently displayed notice plus a short history for renderers
/// that print everything at the end of an operation (the CLI).
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    current: Option<Shown>,
    history: Vec<Notice>,
}

impl NotificationCenter {
    const HISTORY_LIMIT: usize = 32;

    pub fn push(&mut self, notice: Notice) {
        self.push_at(notice, now_millis());
    }

    pub fn push_at(&mut self, notice: Notice, now_ms: i64) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "notice");
        if self.history.len() == Self::HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(notice.clone());
        self.current = Some(Shown {
            notice,
            shown_at_ms: now_ms,
        });
    }

    /// The visible notice at `now_ms`, if its display window is still open.
    pub fn current(&self, now_ms: i64) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|shown| now_ms - shown.shown_at_ms < shown.notice.duration.millis())
            .map(|shown| &shown.notice)
    }

    pub fn history(&self) -> &[Notice] {
        &self.history
    }

    /// Remove and return every recorded notice.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.current = None;
        std::mem::take(&mut self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_notice_replaces_current() {
        let mut center = NotificationCenter::default();
        center.push_at(Notice::info("first", NoticeDuration::Long), 0);
        center.push_at(Notice::danger("second", NoticeDuration::Short), 100);

        let current = center.current(100).unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(center.history().len(), 2);
    }

    #[test]
    fn notice_expires_after_its_duration() {
        let mut center = NotificationCenter::default();
        center.push_at(Notice::info("saved", NoticeDuration::Medium), 1_000);

        assert!(center.current(2_999).is_some());
        assert!(center.current(3_000).is_none());
    }

    #[test]
    fn drain_clears_history_and_current() {
        let mut center = NotificationCenter::default();
        center.push_at(Notice::warning("offline", NoticeDuration::Long), 0);

        assert_eq!(center.drain().len(), 1);
        assert!(center.history().is_empty());
        assert!(center.current(0).is_none());
    }
}
