//! Debug log collector.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use snare_domain::logs::{filter_logs, sort_logs};
use snare_domain::{
    EnhancedLogEntry, FilterOptions, LogEntry, LogSortField, LogSource, SortDirection,
    format_timestamp,
};
use tracing::debug;

use super::{EventBus, Subscription};
use crate::error::ApplicationResult;
use crate::ports::{ApiResult, ArtifactStore, Clock, LogApi};

#[derive(Default)]
struct FeedState {
    entries: Vec<EnhancedLogEntry>,
    seen: HashSet<String>,
    next_id: u64,
    next_proxy_id: u64,
}

impl FeedState {
    fn reset(&mut self) {
        self.entries.clear();
        self.seen.clear();
        self.next_id = 1;
        self.next_proxy_id = 1;
    }

    fn accept(&mut self, entry: &LogEntry, arrived_at: String) {
        if !self.seen.insert(entry.id.clone()) {
            return;
        }
        let incremental_id = self.next_id;
        self.next_id += 1;
        let proxy_id = (entry.source == LogSource::Proxy).then(|| {
            let id = self.next_proxy_id;
            self.next_proxy_id += 1;
            id.to_string()
        });
        let mut entry = entry.clone();
        if entry.source != LogSource::Proxy {
            entry.timestamp = arrived_at;
        }
        self.entries.push(EnhancedLogEntry {
            entry,
            incremental_id,
            proxy_id,
        });
    }
}

/// Filter and sort settings for reading the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogView {
    /// Matches message or URL.
    pub quick_filter: String,
    /// Column filters.
    pub options: FilterOptions,
    /// Sort column.
    pub field: LogSortField,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Collects every published entry once, in arrival order.
///
/// Entries are keyed by id, so backend logs republished on every poll show
/// up a single time. Each accepted entry gets an incremental id, and Proxy
/// entries also get a proxy sequence number. Proxy entries keep the capture
/// time; every other entry is stamped with its arrival time.
pub struct LogFeed {
    state: Arc<Mutex<FeedState>>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    _subscription: Subscription,
}

impl LogFeed {
    /// Subscribes to the bus and announces itself with a System entry.
    #[must_use]
    pub fn attach(bus: &EventBus, clock: Arc<dyn Clock>) -> Self {
        let state = Arc::new(Mutex::new(FeedState {
            next_id: 1,
            next_proxy_id: 1,
            ..FeedState::default()
        }));

        let sink = Arc::clone(&state);
        let stamp = Arc::clone(&clock);
        let subscription = bus.subscribe(move |entry| {
            sink.lock().accept(entry, format_timestamp(stamp.now()));
        });

        bus.info(LogSource::System, "Log system initialized", None);

        Self {
            state,
            bus: bus.clone(),
            clock,
            _subscription: subscription,
        }
    }

    /// Every entry in arrival order.
    #[must_use]
    pub fn entries(&self) -> Vec<EnhancedLogEntry> {
        self.state.lock().entries.clone()
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries matching the quick filter and column filters.
    #[must_use]
    pub fn filtered(&self, quick_filter: &str, options: &FilterOptions) -> Vec<EnhancedLogEntry> {
        filter_logs(&self.state.lock().entries, quick_filter, options)
    }

    /// Entries ordered by a column.
    #[must_use]
    pub fn sorted(&self, field: LogSortField, direction: SortDirection) -> Vec<EnhancedLogEntry> {
        sort_logs(&self.state.lock().entries, field, direction)
    }

    /// Entries filtered then sorted.
    #[must_use]
    pub fn view(&self, view: &LogView) -> Vec<EnhancedLogEntry> {
        let filtered = self.filtered(&view.quick_filter, &view.options);
        sort_logs(&filtered, view.field, view.direction)
    }

    /// Clears captured logs on the backend, then empties the feed and resets
    /// the seen ids and both counters.
    ///
    /// # Errors
    /// Returns the backend error; the feed is left untouched.
    pub async fn clear(&self, api: &dyn LogApi) -> ApiResult<()> {
        api.clear_logs().await?;
        self.state.lock().reset();
        debug!("debug log cleared");
        Ok(())
    }

    /// Re-publishes the backend's captured logs so new ones enter the feed.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn refresh(&self, api: &dyn LogApi) -> ApiResult<usize> {
        let logs = api.fetch_logs().await?;
        let entries: Vec<LogEntry> = logs.iter().map(LogEntry::from_proxy_log).collect();
        self.bus.publish_all(&entries);
        Ok(entries.len())
    }

    /// Writes every entry as pretty JSON to `snare-proxy-logs-{timestamp}.json`.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    pub async fn export(&self, store: &dyn ArtifactStore) -> ApplicationResult<PathBuf> {
        let json = serde_json::to_vec_pretty(&self.entries())?;
        let name = format!(
            "snare-proxy-logs-{}.json",
            format_timestamp(self.clock.now())
        );
        Ok(store.save(&name, &json).await?)
    }
}
