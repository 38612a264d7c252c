//! Clock port

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Throttling, status expiry and log timestamps all read time through this
/// port so tests can drive it.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds elapsed since `earlier`; negative if `earlier` is ahead.
    fn millis_since(&self, earlier: DateTime<Utc>) -> i64 {
        (self.now() - earlier).num_milliseconds()
    }
}
