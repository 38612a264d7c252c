//! Service wiring and command execution.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use snare_application::{
    ArtifactStore, Clock, ConfigPatch, EventBus, FetchOutcome, KeyValueStore, LogApi, LogFeed,
    LogSyncController, LogView, RepeaterApi, RequestDispatcher, RequestEdit, SessionApi,
    SessionTransfer, SettingsApi, SettingsService, StatusBoard, StatusReporter, TabStore,
    TabTransfer, ViewContext,
};
use snare_domain::codec::{
    curl_for_log, format_proxy_request, format_proxy_response, format_response,
    repeater_seed_from_log,
};
use snare_domain::logs::{filter_proxy_logs, sort_proxy_logs};
use snare_domain::{EnhancedLogEntry, ProxyLog, ProxySettings, ProxySortColumn, SortDirection, Tab};
use snare_infrastructure::to_json_stable;
use tracing::{debug, warn};

use crate::command::{Command, HELP, View};

/// Every backend endpoint the panel talks to.
pub trait Backend: LogApi + RepeaterApi + SessionApi + SettingsApi + 'static {}

impl<T: LogApi + RepeaterApi + SessionApi + SettingsApi + 'static> Backend for T {}

/// Screen currently shown. Only the proxy view consumes traffic.
#[derive(Default)]
pub struct ActiveView(Mutex<View>);

impl ActiveView {
    /// Current screen.
    #[must_use]
    pub fn get(&self) -> View {
        *self.0.lock()
    }

    fn set(&self, view: View) {
        *self.0.lock() = view;
    }
}

impl ViewContext for ActiveView {
    fn is_active_view(&self) -> bool {
        self.get() == View::Proxy
    }
}

/// The control panel: owns the tab store and the services acting on it.
pub struct App {
    view: Arc<ActiveView>,
    clock: Arc<dyn Clock>,
    status: Arc<StatusBoard>,
    feed: LogFeed,
    tabs: TabStore,
    dispatcher: RequestDispatcher,
    tab_transfer: TabTransfer,
    logs: Arc<LogSyncController>,
    session: SessionTransfer,
    settings: SettingsService,
    log_api: Arc<dyn LogApi>,
    artifacts: Arc<dyn ArtifactStore>,
    traffic_order: (ProxySortColumn, SortDirection),
}

impl App {
    /// Wires the services and restores the saved tabs.
    pub fn new<B: Backend>(
        backend: Arc<B>,
        storage: Arc<dyn KeyValueStore>,
        artifacts: Arc<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let view = Arc::new(ActiveView::default());
        let events = EventBus::new(Arc::clone(&clock));
        let feed = LogFeed::attach(&events, Arc::clone(&clock));
        let status = Arc::new(StatusBoard::new(Arc::clone(&clock)));
        let reporter: Arc<dyn StatusReporter> = status.clone();
        let log_api: Arc<dyn LogApi> = backend.clone();

        let logs = LogSyncController::new(
            Arc::clone(&log_api),
            Arc::clone(&reporter),
            view.clone(),
            Arc::clone(&clock),
            events.clone(),
        );
        let session = SessionTransfer::new(
            backend.clone(),
            Arc::clone(&artifacts),
            Arc::clone(&reporter),
            Arc::clone(&clock),
            events.clone(),
            Arc::clone(&logs),
        );

        Self {
            view,
            status,
            feed,
            tabs: TabStore::restore(storage),
            dispatcher: RequestDispatcher::new(
                backend.clone(),
                Arc::clone(&reporter),
                events.clone(),
            ),
            tab_transfer: TabTransfer::new(Arc::clone(&artifacts), Arc::clone(&reporter)),
            logs,
            session,
            settings: SettingsService::new(backend, reporter, events),
            log_api,
            artifacts,
            clock,
            traffic_order: (ProxySortColumn::Id, SortDirection::Asc),
        }
    }

    /// Enters the proxy view, which starts log polling. Needs a runtime.
    pub fn start(&self) {
        self.view.set(View::Proxy);
        self.logs.on_view_enter();
    }

    /// Stops polling and cancels any in-flight fetch.
    pub fn shutdown(&self) {
        self.logs.shutdown();
    }

    /// Screen currently shown.
    #[must_use]
    pub fn view(&self) -> View {
        self.view.get()
    }

    /// Repeater tabs.
    #[must_use]
    pub const fn tabs(&self) -> &TabStore {
        &self.tabs
    }

    /// Captured traffic controller.
    #[must_use]
    pub const fn logs(&self) -> &Arc<LogSyncController> {
        &self.logs
    }

    /// Unified debug log.
    #[must_use]
    pub const fn feed(&self) -> &LogFeed {
        &self.feed
    }

    /// Executes one command and returns the lines to print, followed by
    /// any pending status notices.
    pub async fn handle(&mut self, command: Command) -> Vec<String> {
        debug!(?command, "handling command");
        let mut out = self.execute(command).await;

        self.status.expire(self.clock.now());
        let (error, success) = self.status.drain();
        out.extend(error.map(|e| format!("error: {e}")));
        out.extend(success.map(|s| format!("ok: {s}")));
        out
    }

    async fn execute(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::Help => HELP.lines().map(str::to_string).collect(),
            Command::Quit => {
                self.shutdown();
                Vec::new()
            }
            Command::View(view) => self.switch_view(view).await,

            Command::ListLogs { filter } => self.traffic(filter.as_deref().unwrap_or("")),
            Command::SortLogs { column, direction } => {
                self.traffic_order = (column, direction);
                self.traffic("")
            }
            Command::FetchLogs => match self.logs.refresh().await {
                FetchOutcome::Updated(count) => vec![format!("{count} logs")],
                FetchOutcome::Skipped => {
                    vec!["traffic is only fetched on the proxy view".to_string()]
                }
                FetchOutcome::Throttled | FetchOutcome::Discarded | FetchOutcome::Failed(_) => {
                    Vec::new()
                }
            },
            Command::ShowLog { id } => self.with_log(id, |log| {
                let mut out: Vec<String> = format_proxy_request(log)
                    .lines()
                    .map(str::to_string)
                    .collect();
                out.push(String::new());
                out.extend(format_proxy_response(log).lines().map(str::to_string));
                out
            }),
            Command::CurlLog { id } => self.with_log(id, |log| vec![curl_for_log(log)]),
            Command::DeleteLog { id } => {
                if let Some(log) = self.logs.log(id) {
                    let _ = self.logs.delete_one(&log).await;
                    Vec::new()
                } else {
                    vec![no_log(id)]
                }
            }
            Command::ClearLogs => {
                let _ = self.logs.clear_all().await;
                Vec::new()
            }
            Command::SendToRepeater { id } => self.send_to_repeater(id).await,

            Command::ListTabs => self.tabs.tabs().iter().map(|t| self.tab_row(t)).collect(),
            Command::NewTab => {
                let id = self.tabs.create_tab(None);
                vec![format!("opened {}", snare_domain::short_id(&id))]
            }
            Command::SelectTab { id } => self.with_tab(&id, |tabs, id| {
                tabs.set_active_tab(id);
            }),
            Command::CloseTab { id } => self.with_tab(&id, TabStore::close_tab),
            Command::CloseAllTabs => {
                self.tabs.close_all_tabs();
                Vec::new()
            }
            Command::RenameTab { id, name } => {
                self.with_tab(&id, |tabs, id| tabs.rename_tab(id, &name))
            }
            Command::SortTabs => {
                self.tabs.sort_tabs_by_name();
                self.tabs.tabs().iter().map(|t| self.tab_row(t)).collect()
            }

            Command::SetHost(host) => self.configure(ConfigPatch {
                host: Some(host),
                ..ConfigPatch::default()
            }),
            Command::SetPort(port) => self.configure(ConfigPatch {
                port: Some(port),
                ..ConfigPatch::default()
            }),
            Command::SetProtocol(protocol) => self.configure(ConfigPatch {
                protocol: Some(protocol),
                ..ConfigPatch::default()
            }),
            Command::SetRedirects(follow) => self.configure(ConfigPatch {
                follow_redirects: Some(follow),
                ..ConfigPatch::default()
            }),
            Command::SetHeaders(headers) => self.edit(RequestEdit::Headers(headers)),
            Command::SetBody(body) => self.edit(RequestEdit::Body(body)),
            Command::ShowRequest => self.active_request(),
            Command::Send => self.send().await,
            Command::ClearRequest => {
                self.dispatcher.clear(&mut self.tabs);
                Vec::new()
            }
            Command::ExportTabs => written(self.tab_transfer.export_tabs(&self.tabs).await.ok()),
            Command::ImportTabs { path } => self.import_tabs(&path).await,

            Command::ExportSession => written(self.session.export_artifact().await.ok()),
            Command::ImportSession { path } => {
                let _ = self.session.import_file(&path).await;
                Vec::new()
            }

            Command::ShowSettings => self
                .settings
                .load()
                .await
                .map(|s| render_settings(&s))
                .unwrap_or_default(),
            Command::SetSetting(patch) => self
                .settings
                .save(&patch)
                .await
                .map(|s| render_settings(&s))
                .unwrap_or_default(),

            Command::DebugLog { filter } => {
                let view = LogView {
                    quick_filter: filter.unwrap_or_default(),
                    ..LogView::default()
                };
                self.feed.view(&view).iter().map(debug_row).collect()
            }
            Command::DebugClear => {
                match self.feed.clear(self.log_api.as_ref()).await {
                    Ok(()) => self.status.success("Logs cleared successfully"),
                    Err(error) => self.status.error(&error.message_or("Failed to clear logs")),
                }
                Vec::new()
            }
            Command::DebugExport => match self.feed.export(self.artifacts.as_ref()).await {
                Ok(path) => written(Some(path)),
                Err(error) => {
                    warn!(%error, "debug log export failed");
                    self.status.error("Failed to export logs");
                    Vec::new()
                }
            },
        }
    }

    async fn switch_view(&mut self, view: View) -> Vec<String> {
        let previous = self.view.get();
        self.view.set(view);
        if previous == View::Proxy && view != View::Proxy {
            self.logs.on_view_leave();
        } else if previous != View::Proxy && view == View::Proxy {
            self.logs.on_view_enter();
        }

        match view {
            View::Settings => self
                .settings
                .load()
                .await
                .map(|s| render_settings(&s))
                .unwrap_or_default(),
            View::Repeater => self.tabs.tabs().iter().map(|t| self.tab_row(t)).collect(),
            View::Proxy | View::Logs => Vec::new(),
        }
    }

    /// Opens a captured request in a new, active repeater tab and moves to
    /// the repeater view. Polling is stopped first and resumed on failure.
    async fn send_to_repeater(&mut self, id: u64) -> Vec<String> {
        self.logs.stop_polling();

        let seed = self
            .logs
            .log(id)
            .ok_or_else(|| no_log(id))
            .and_then(|log| repeater_seed_from_log(&log).map_err(|e| e.to_string()));

        match seed {
            Ok(seed) => {
                let tab_id = self.tabs.create_tab(Some(seed));
                self.tabs.set_active_tab(&tab_id);
                self.status.success("Request sent to Repeater");
                self.switch_view(View::Repeater).await
            }
            Err(error) => {
                warn!(%error, log = id, "sending to repeater failed");
                self.status.error("Failed to send request to Repeater");
                self.logs.start_polling();
                Vec::new()
            }
        }
    }

    async fn send(&mut self) -> Vec<String> {
        self.dispatcher.send(&mut self.tabs).await;
        if self.status.current_success().is_none() {
            return Vec::new();
        }
        self.tabs
            .active_tab()
            .and_then(|tab| tab.response.as_ref())
            .map(|response| {
                format_response(response)
                    .lines()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn import_tabs(&mut self, path: &Path) -> Vec<String> {
        let content = match self.artifacts.read(path).await {
            Ok(content) => content,
            Err(error) => {
                warn!(%error, path = %path.display(), "reading tabs file failed");
                self.status.error("Failed to import tabs");
                return Vec::new();
            }
        };
        self.tab_transfer
            .import_tabs(&mut self.tabs, &content)
            .map(|ids| vec![format!("imported {} tabs", ids.len())])
            .unwrap_or_default()
    }

    fn traffic(&self, filter: &str) -> Vec<String> {
        let (column, direction) = self.traffic_order;
        let logs = filter_proxy_logs(&self.logs.logs(), filter);
        sort_proxy_logs(&logs, column, direction)
            .iter()
            .map(traffic_row)
            .collect()
    }

    fn with_log(&self, id: u64, render: impl FnOnce(&ProxyLog) -> Vec<String>) -> Vec<String> {
        match self.logs.log(id) {
            Some(log) => {
                let out = render(&log);
                self.logs.select(Some(log));
                out
            }
            None => vec![no_log(id)],
        }
    }

    /// Runs `action` on the single tab whose id starts with `prefix`.
    fn with_tab(&mut self, prefix: &str, action: impl FnOnce(&mut TabStore, &str)) -> Vec<String> {
        let matches: Vec<String> = self
            .tabs
            .tabs()
            .iter()
            .filter(|t| t.id.starts_with(prefix))
            .map(|t| t.id.clone())
            .collect();
        match matches.as_slice() {
            [id] => {
                action(&mut self.tabs, id);
                Vec::new()
            }
            [] => vec![format!("no tab matches {prefix}")],
            _ => vec![format!("{prefix} matches {} tabs", matches.len())],
        }
    }

    fn configure(&mut self, patch: ConfigPatch) -> Vec<String> {
        self.dispatcher.update_config(&mut self.tabs, patch);
        self.active_request()
    }

    fn edit(&mut self, edit: RequestEdit) -> Vec<String> {
        self.dispatcher.update_request(&mut self.tabs, edit);
        self.active_request()
    }

    fn active_request(&self) -> Vec<String> {
        let Some(tab) = self.tabs.active_tab() else {
            return vec!["no active tab".to_string()];
        };
        let config = &tab.config;
        let mut out = vec![format!(
            "{}://{}:{} (redirects {})",
            config.protocol,
            config.host,
            config.port,
            if config.follow_redirects { "on" } else { "off" }
        )];
        out.extend(tab.request.headers.lines().map(str::to_string));
        if !tab.request.body.is_empty() {
            out.push(String::new());
            out.extend(tab.request.body.lines().map(str::to_string));
        }
        out
    }

    fn tab_row(&self, tab: &Tab) -> String {
        let marker = if self.tabs.active_tab_id() == Some(tab.id.as_str()) {
            '*'
        } else {
            ' '
        };
        format!(
            "{marker} {}  {}  {} {}",
            tab.short_id(),
            tab.name,
            tab.request.request_line_method(),
            tab.config.host
        )
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn no_log(id: u64) -> String {
    format!("no log with id {id}")
}

fn written(path: Option<std::path::PathBuf>) -> Vec<String> {
    path.map(|p| vec![format!("wrote {}", p.display())])
        .unwrap_or_default()
}

fn traffic_row(log: &ProxyLog) -> String {
    let status = log
        .status
        .map_or_else(|| "-".to_string(), |s| s.to_string());
    format!(
        "{:>5}  {:<7} {:<7} {}",
        log.id,
        log.effective_method(),
        status,
        log.effective_url()
    )
}

fn debug_row(entry: &EnhancedLogEntry) -> String {
    format!(
        "{:>5}  {}  {:<7} {:<9} {}",
        entry.display_id(),
        entry.entry.timestamp,
        entry.entry.log_type.to_string(),
        entry.entry.source.to_string(),
        entry.entry.message
    )
}

fn render_settings(settings: &ProxySettings) -> Vec<String> {
    match to_json_stable(settings) {
        Ok(json) => json.lines().map(str::to_string).collect(),
        Err(error) => vec![error.to_string()],
    }
}
