//! Publish/subscribe bus for `LogEntry` records.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::Rng;
use snare_domain::{LogDetails, LogEntry, LogSource, LogType};

use crate::ports::Clock;

type Callback = Arc<dyn Fn(&LogEntry) + Send + Sync>;

struct Inner {
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_subscriber: AtomicU64,
    clock: Arc<dyn Clock>,
}

/// Fan-out of log entries to every subscriber.
///
/// Created once at startup and shared by cloning.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

/// Keeps a callback registered; unsubscribes when dropped.
pub struct Subscription {
    bus: Weak<Inner>,
    id: u64,
}

impl Subscription {
    /// Removes the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.subscribers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl EventBus {
    /// Creates a bus stamping client entries with the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(1),
                clock,
            }),
        }
    }

    /// Registers a callback for every future entry.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Delivers an entry to every subscriber.
    pub fn publish(&self, entry: &LogEntry) {
        // Callbacks run outside the lock so they may publish or subscribe.
        let callbacks: Vec<Callback> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(entry);
        }
    }

    /// Delivers several entries in order.
    pub fn publish_all(&self, entries: &[LogEntry]) {
        for entry in entries {
            self.publish(entry);
        }
    }

    /// Builds a client entry with a fresh id and timestamp, publishes it and
    /// returns it.
    pub fn log(
        &self,
        log_type: LogType,
        source: LogSource,
        message: impl Into<String>,
        details: Option<LogDetails>,
    ) -> LogEntry {
        let now = self.inner.clock.now();
        let entry = LogEntry::new(
            client_entry_id(now.timestamp_millis()),
            now,
            log_type,
            source,
            message,
            details,
        );
        self.publish(&entry);
        entry
    }

    /// Publishes an `info` entry.
    pub fn info(
        &self,
        source: LogSource,
        message: impl Into<String>,
        details: Option<LogDetails>,
    ) -> LogEntry {
        self.log(LogType::Info, source, message, details)
    }

    /// Publishes an `error` entry.
    pub fn error(
        &self,
        source: LogSource,
        message: impl Into<String>,
        details: Option<LogDetails>,
    ) -> LogEntry {
        self.log(LogType::Error, source, message, details)
    }

    /// Publishes a `warning` entry.
    pub fn warning(
        &self,
        source: LogSource,
        message: impl Into<String>,
        details: Option<LogDetails>,
    ) -> LogEntry {
        self.log(LogType::Warning, source, message, details)
    }

    /// Publishes a `request` entry.
    pub fn request(
        &self,
        source: LogSource,
        message: impl Into<String>,
        details: Option<LogDetails>,
    ) -> LogEntry {
        self.log(LogType::Request, source, message, details)
    }
}

/// `{epoch millis}-{9 random base36 chars}`.
fn client_entry_id(millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();
    format!("{millis}-{suffix}")
}
