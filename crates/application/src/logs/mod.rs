//! Captured traffic synchronization.

mod sync;

pub use sync::{FetchOutcome, LogSyncController, POLL_INTERVAL, THROTTLE_WINDOW_MS};
