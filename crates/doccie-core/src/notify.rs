// SPDX-License-Identifier: Apache-2.0

//! Transient user notifications.
//!
//! Network and validation failures are caught where they happen and turned
//! into a [`Notice`] instead of propagating to the rendering layer. Each
//! platform decides how a notice is shown by implementing [`Notifier`].

use std::sync::Mutex;

use serde::Serialize;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational, not an error (e.g. documentation not generated yet).
    Info,
    /// An action completed.
    Success,
    /// An action completed with a side effect worth flagging.
    Warning,
    /// An action failed.
    Error,
}

/// A short message shown to the user once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// Creates a notice.
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Receives notices emitted by controllers.
pub trait Notifier: Send + Sync {
    /// Shows a notice to the user.
    fn notify(&self, notice: Notice);

    /// Convenience for [`NoticeLevel::Info`].
    fn info(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Info, message));
    }

    /// Convenience for [`NoticeLevel::Success`].
    fn success(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Success, message));
    }

    /// Convenience for [`NoticeLevel::Warning`].
    fn warning(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Warning, message));
    }

    /// Convenience for [`NoticeLevel::Error`].
    fn error(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Error, message));
    }
}

/// Drops every notice. Useful for headless callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notice: Notice) {}
}

/// Keeps every notice in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the notices recorded so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded notices of one level.
    pub fn of_level(&self, level: NoticeLevel) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notice);
    }
}
