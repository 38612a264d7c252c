//! Polling synchronization of the captured traffic list.
//!
//! The controller keeps the latest backend log list while the traffic view
//! is on screen. A repeating timer fetches every [`POLL_INTERVAL`]; fetches
//! closer than [`THROTTLE_WINDOW_MS`] to the previous one are skipped, and a
//! new fetch cancels the one still in flight. Results that resolve after the
//! controller was stopped, the view was left or the fetch was cancelled are
//! discarded.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use snare_domain::{LogEntry, ProxyLog};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cancellation::CancellationToken;
use crate::events::EventBus;
use crate::ports::{ApiError, ApiResult, Clock, LogApi, StatusReporter, ViewContext};

/// Delay between timer-driven fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Minimum spacing between accepted fetches.
pub const THROTTLE_WINDOW_MS: i64 = 1_000;

/// What a fetch attempt ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Polling is stopped or the view is not active.
    Skipped,
    /// Too soon after the previous fetch.
    Throttled,
    /// The list was replaced with this many logs.
    Updated(usize),
    /// The result arrived after cancellation, stop or view change.
    Discarded,
    /// The backend call failed.
    Failed(ApiError),
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

struct SyncState {
    enabled: bool,
    logs: Vec<ProxyLog>,
    selected: Option<ProxyLog>,
    last_fetch: Option<DateTime<Utc>>,
    generation: u64,
    in_flight: Option<InFlight>,
    timer: Option<JoinHandle<()>>,
}

/// Counts running backend operations; decrements on drop.
struct Busy<'a>(&'a AtomicUsize);

impl<'a> Busy<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Keeps the captured traffic list in sync with the backend.
pub struct LogSyncController {
    api: Arc<dyn LogApi>,
    status: Arc<dyn StatusReporter>,
    view: Arc<dyn ViewContext>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    busy: AtomicUsize,
    state: Mutex<SyncState>,
}

impl LogSyncController {
    /// Creates an enabled controller with no timer running.
    #[must_use]
    pub fn new(
        api: Arc<dyn LogApi>,
        status: Arc<dyn StatusReporter>,
        view: Arc<dyn ViewContext>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            status,
            view,
            clock,
            events,
            busy: AtomicUsize::new(0),
            state: Mutex::new(SyncState {
                enabled: true,
                logs: Vec::new(),
                selected: None,
                last_fetch: None,
                generation: 0,
                in_flight: None,
                timer: None,
            }),
        })
    }

    /// Current log list.
    #[must_use]
    pub fn logs(&self) -> Vec<ProxyLog> {
        self.state.lock().logs.clone()
    }

    /// Looks up a log in the current list.
    #[must_use]
    pub fn log(&self, id: u64) -> Option<ProxyLog> {
        self.state.lock().logs.iter().find(|l| l.id == id).cloned()
    }

    /// Selected log, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ProxyLog> {
        self.state.lock().selected.clone()
    }

    /// Selects a log, or clears the selection.
    pub fn select(&self, log: Option<ProxyLog>) {
        self.state.lock().selected = log;
    }

    /// Returns true while any backend call is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::SeqCst) > 0
    }

    /// Returns true while polling is enabled.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.state.lock().enabled
    }

    /// Fetches the log list unless stopped, off view or throttled.
    pub async fn fetch_once(&self) -> FetchOutcome {
        self.fetch(true).await
    }

    /// Fetches the log list without the throttle.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch(false).await
    }

    async fn fetch(&self, throttled: bool) -> FetchOutcome {
        let (generation, mut cancelled) = {
            let mut state = self.state.lock();
            if !state.enabled || !self.view.is_active_view() {
                return FetchOutcome::Skipped;
            }

            let now = self.clock.now();
            if throttled
                && state
                    .last_fetch
                    .is_some_and(|last| (now - last).num_milliseconds() < THROTTLE_WINDOW_MS)
            {
                return FetchOutcome::Throttled;
            }
            state.last_fetch = Some(now);

            if let Some(previous) = state.in_flight.take() {
                debug!(
                    generation = previous.generation,
                    "cancelling in-flight fetch"
                );
                previous.token.cancel();
            }
            let (token, receiver) = CancellationToken::pair();
            state.generation += 1;
            let generation = state.generation;
            state.in_flight = Some(InFlight { generation, token });
            (generation, receiver)
        };

        let _busy = Busy::start(&self.busy);
        let result = tokio::select! {
            biased;
            () = cancelled.cancelled() => Err(ApiError::Cancelled),
            result = self.api.fetch_logs() => result,
        };

        let mut state = self.state.lock();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
        {
            state.in_flight = None;
        }

        match result {
            Ok(logs) => {
                if !state.enabled || !self.view.is_active_view() || cancelled.is_cancelled() {
                    debug!(generation, "discarding stale fetch result");
                    return FetchOutcome::Discarded;
                }
                let entries: Vec<LogEntry> = logs.iter().map(LogEntry::from_proxy_log).collect();
                let count = logs.len();
                state.logs = logs;
                drop(state);

                debug!(generation, count, "log list updated");
                self.events.publish_all(&entries);
                FetchOutcome::Updated(count)
            }
            Err(error) if error.is_cancelled() => FetchOutcome::Discarded,
            Err(error) => {
                let on_view = self.view.is_active_view();
                drop(state);

                warn!(%error, "fetching logs failed");
                if on_view {
                    self.status.error(&error.message_or("Failed to fetch logs"));
                }
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Enables polling: one fetch now, then one every [`POLL_INTERVAL`].
    ///
    /// Does nothing while a timer is already running or the view is not
    /// active.
    pub fn start_polling(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.enabled && state.timer.is_some() {
            return;
        }
        if !self.view.is_active_view() {
            return;
        }

        state.enabled = true;
        if let Some(stale) = state.timer.take() {
            stale.abort();
        }
        state.timer = Some(spawn_timer(Arc::downgrade(self)));
        info!("log polling started");
    }

    /// Disables polling, stops the timer and cancels the in-flight fetch.
    pub fn stop_polling(&self) {
        let mut state = self.state.lock();
        state.enabled = false;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.token.cancel();
        }
        info!("log polling stopped");
    }

    /// The traffic view became active.
    pub fn on_view_enter(self: &Arc<Self>) {
        self.start_polling();
    }

    /// The traffic view was left.
    pub fn on_view_leave(&self) {
        self.stop_polling();
    }

    /// Final teardown.
    pub fn shutdown(&self) {
        self.stop_polling();
    }

    /// Clears every captured log on the backend.
    ///
    /// On success the list and selection are emptied and the throttle is
    /// reset; on failure nothing changes.
    ///
    /// # Errors
    /// Returns the backend error after reporting it.
    pub async fn clear_all(&self) -> ApiResult<()> {
        let _busy = Busy::start(&self.busy);
        match self.api.clear_logs().await {
            Ok(()) => {
                {
                    let mut state = self.state.lock();
                    state.logs.clear();
                    state.selected = None;
                    state.last_fetch = None;
                }
                self.status.success("Logs cleared successfully");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "clearing logs failed");
                self.status.error(&error.message_or("Failed to clear logs"));
                Err(error)
            }
        }
    }

    /// Deletes one captured log on the backend and drops it from the list.
    ///
    /// # Errors
    /// Returns the backend error after reporting it.
    pub async fn delete_one(&self, log: &ProxyLog) -> ApiResult<()> {
        let _busy = Busy::start(&self.busy);
        match self.api.delete_log(log.id).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock();
                    state.logs.retain(|l| l.id != log.id);
                    if state.selected.as_ref().is_some_and(|s| s.id == log.id) {
                        state.selected = None;
                    }
                }
                self.status.success("Log deleted successfully");
                Ok(())
            }
            Err(error) => {
                warn!(%error, id = log.id, "deleting log failed");
                self.status.error(&error.message_or("Failed to delete log"));
                Err(error)
            }
        }
    }
}

impl Drop for LogSyncController {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

/// Ticks immediately, then every [`POLL_INTERVAL`]. Each tick runs its fetch
/// as a separate task so a slow fetch is cancelled by the next one.
fn spawn_timer(controller: Weak<LogSyncController>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(controller) = controller.upgrade() else {
                break;
            };
            tokio::spawn(async move {
                controller.fetch_once().await;
            });
        }
    })
}
