//! Default status notice holder.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::ports::{Clock, StatusReporter};

/// How long a notice stays visible, in seconds.
pub const NOTICE_TTL_SECS: i64 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    message: String,
    raised_at: DateTime<Utc>,
}

#[derive(Default)]
struct Slots {
    error: Option<Notice>,
    success: Option<Notice>,
}

/// Holds the latest error and success notices, dropping each one after
/// [`NOTICE_TTL_SECS`].
pub struct StatusBoard {
    slots: Mutex<Slots>,
    clock: Arc<dyn Clock>,
}

impl StatusBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            clock,
        }
    }

    /// Current error notice.
    #[must_use]
    pub fn current_error(&self) -> Option<String> {
        self.slots.lock().error.as_ref().map(|n| n.message.clone())
    }

    /// Current success notice.
    #[must_use]
    pub fn current_success(&self) -> Option<String> {
        self.slots
            .lock()
            .success
            .as_ref()
            .map(|n| n.message.clone())
    }

    /// Drops notices older than the TTL as of `now`.
    pub fn expire(&self, now: DateTime<Utc>) {
        let ttl = Duration::seconds(NOTICE_TTL_SECS);
        let stale = |n: &Option<Notice>| n.as_ref().is_some_and(|n| now - n.raised_at >= ttl);
        let mut slots = self.slots.lock();
        if stale(&slots.error) {
            slots.error = None;
        }
        if stale(&slots.success) {
            slots.success = None;
        }
    }

    /// Takes both notices, leaving the slots empty.
    pub fn drain(&self) -> (Option<String>, Option<String>) {
        let mut slots = self.slots.lock();
        (
            slots.error.take().map(|n| n.message),
            slots.success.take().map(|n| n.message),
        )
    }

    fn notice(&self, message: Option<String>) -> Option<Notice> {
        message.map(|message| Notice {
            message,
            raised_at: self.clock.now(),
        })
    }
}

impl StatusReporter for StatusBoard {
    fn set_error(&self, message: Option<String>) {
        let notice = self.notice(message);
        self.slots.lock().error = notice;
    }

    fn set_success(&self, message: Option<String>) {
        let notice = self.notice(message);
        self.slots.lock().success = notice;
    }
}
