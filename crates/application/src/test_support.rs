//! Hand-written port doubles shared by the unit tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use snare_domain::{
    CapturedRequest, HeaderMap, ProxyLog, ProxyLogStatus, ProxySettings, ReplayPayload,
    SessionArtifact, SettingsPatch,
};

use crate::ports::{
    ApiError, ApiResult, ArtifactStore, Clock, KeyValueStore, LogApi, RepeaterApi, ReplayReply,
    SessionApi, SettingsApi, StatusReporter, StorageError, ViewContext,
};

/// Builds a captured GET/POST log with a nested request.
pub fn proxy_log(id: u64, method: &str, url: &str) -> ProxyLog {
    let mut headers = HeaderMap::new();
    headers.insert("Accept".to_string(), "*/*".to_string());
    ProxyLog {
        id,
        timestamp: "2024-03-20T10:00:00Z".to_string(),
        method: Some(method.to_string()),
        url: Some(url.to_string()),
        status: Some(ProxyLogStatus::Code(200)),
        content_length: Some(0),
        request: Some(CapturedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers,
            content: None,
        }),
        response: None,
        error: None,
    }
}

/// Clock that only moves when told to.
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn at_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
            .single()
            .expect("valid millis")
    }
}

/// Clock following tokio's (pausable) time.
pub struct TokioClock {
    origin: tokio::time::Instant,
    base: DateTime<Utc>,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            base: Utc
                .timestamp_millis_opt(1_700_000_000_000)
                .single()
                .expect("valid"),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed()).expect("in range");
        self.base + elapsed
    }
}

/// Records every notice.
#[derive(Default)]
pub struct RecordingStatus {
    errors: Mutex<Vec<Option<String>>>,
    successes: Mutex<Vec<Option<String>>>,
}

impl RecordingStatus {
    pub fn last_error(&self) -> Option<String> {
        self.errors.lock().last().cloned().flatten()
    }

    pub fn last_success(&self) -> Option<String> {
        self.successes.lock().last().cloned().flatten()
    }

    /// Non-null errors in order.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().iter().flatten().cloned().collect()
    }

    /// Non-null successes in order.
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().iter().flatten().cloned().collect()
    }
}

impl StatusReporter for RecordingStatus {
    fn set_error(&self, message: Option<String>) {
        self.errors.lock().push(message);
    }

    fn set_success(&self, message: Option<String>) {
        self.successes.lock().push(message);
    }
}

/// View flag settable from tests.
pub struct FlagView(AtomicBool);

impl FlagView {
    pub fn new(active: bool) -> Self {
        Self(AtomicBool::new(active))
    }

    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::SeqCst);
    }
}

impl ViewContext for FlagView {
    fn is_active_view(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct BackendState {
    logs: Vec<ProxyLog>,
    fetch_error: Option<ApiError>,
    fetch_delay: Option<Duration>,
    fetch_calls: usize,
    clear_error: Option<ApiError>,
    clear_calls: usize,
    delete_error: Option<ApiError>,
    deleted: Vec<u64>,
    reply: Option<ApiResult<ReplayReply>>,
    sent: Vec<ReplayPayload>,
    export: Option<ApiResult<SessionArtifact>>,
    import_error: Option<ApiError>,
    imported: Vec<SessionArtifact>,
    settings: ProxySettings,
    settings_error: Option<ApiError>,
    patches: Vec<SettingsPatch>,
}

/// Scriptable backend implementing every API port.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<BackendState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_logs(&self, logs: Vec<ProxyLog>) {
        self.state.lock().logs = logs;
    }

    pub fn fail_fetch(&self, error: ApiError) {
        self.state.lock().fetch_error = Some(error);
    }

    pub fn delay_fetch(&self, delay: Duration) {
        self.state.lock().fetch_delay = Some(delay);
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().fetch_calls
    }

    pub fn fail_clear(&self, error: ApiError) {
        self.state.lock().clear_error = Some(error);
    }

    pub fn clear_calls(&self) -> usize {
        self.state.lock().clear_calls
    }

    pub fn fail_delete(&self, error: ApiError) {
        self.state.lock().delete_error = Some(error);
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.state.lock().deleted.clone()
    }

    pub fn reply_with(&self, reply: ApiResult<ReplayReply>) {
        self.state.lock().reply = Some(reply);
    }

    pub fn sent(&self) -> Vec<ReplayPayload> {
        self.state.lock().sent.clone()
    }

    pub fn export_with(&self, result: ApiResult<SessionArtifact>) {
        self.state.lock().export = Some(result);
    }

    pub fn fail_import(&self, error: ApiError) {
        self.state.lock().import_error = Some(error);
    }

    pub fn imported(&self) -> Vec<SessionArtifact> {
        self.state.lock().imported.clone()
    }

    pub fn set_settings(&self, settings: ProxySettings) {
        self.state.lock().settings = settings;
    }

    pub fn fail_settings(&self, error: ApiError) {
        self.state.lock().settings_error = Some(error);
    }

    pub fn patches(&self) -> Vec<SettingsPatch> {
        self.state.lock().patches.clone()
    }
}

#[async_trait]
impl LogApi for MockBackend {
    async fn fetch_logs(&self) -> ApiResult<Vec<ProxyLog>> {
        // Snapshot at call time; the delay models network latency.
        let (result, delay) = {
            let mut state = self.state.lock();
            state.fetch_calls += 1;
            let result = state
                .fetch_error
                .clone()
                .map_or_else(|| Ok(state.logs.clone()), Err);
            (result, state.fetch_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn clear_logs(&self) -> ApiResult<()> {
        let mut state = self.state.lock();
        state.clear_calls += 1;
        if let Some(error) = state.clear_error.clone() {
            return Err(error);
        }
        state.logs.clear();
        Ok(())
    }

    async fn delete_log(&self, id: u64) -> ApiResult<()> {
        let mut state = self.state.lock();
        if let Some(error) = state.delete_error.clone() {
            return Err(error);
        }
        state.deleted.push(id);
        state.logs.retain(|l| l.id != id);
        Ok(())
    }
}

#[async_trait]
impl RepeaterApi for MockBackend {
    async fn send(&self, payload: &ReplayPayload) -> ApiResult<ReplayReply> {
        let mut state = self.state.lock();
        state.sent.push(payload.clone());
        state.reply.clone().unwrap_or_else(|| {
            Ok(ReplayReply {
                status: 200,
                status_text: None,
                headers: None,
                body: None,
            })
        })
    }
}

#[async_trait]
impl SessionApi for MockBackend {
    async fn export_session(&self) -> ApiResult<SessionArtifact> {
        let state = self.state.lock();
        state.export.clone().unwrap_or_else(|| {
            Ok(SessionArtifact {
                logs: state.logs.clone(),
                settings: state.settings.clone(),
                timestamp: "2024-03-20T10:00:00Z".to_string(),
            })
        })
    }

    async fn import_session(&self, artifact: &SessionArtifact) -> ApiResult<()> {
        let mut state = self.state.lock();
        if let Some(error) = state.import_error.clone() {
            return Err(error);
        }
        state.imported.push(artifact.clone());
        state.logs.clone_from(&artifact.logs);
        Ok(())
    }
}

#[async_trait]
impl SettingsApi for MockBackend {
    async fn get_settings(&self) -> ApiResult<ProxySettings> {
        let state = self.state.lock();
        state
            .settings_error
            .clone()
            .map_or_else(|| Ok(state.settings.clone()), Err)
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> ApiResult<ProxySettings> {
        let mut state = self.state.lock();
        if let Some(error) = state.settings_error.clone() {
            return Err(error);
        }
        state.patches.push(patch.clone());
        state.settings.apply(patch);
        Ok(state.settings.clone())
    }
}

/// In-memory key/value store that can be told to fail writes.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidLocation("read-only".to_string()));
        }
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// In-memory artifact store keyed by file name.
#[derive(Default)]
pub struct MemoryArtifacts {
    files: Mutex<HashMap<PathBuf, String>>,
    fail_saves: AtomicBool,
}

impl MemoryArtifacts {
    pub fn insert(&self, path: &str, contents: &str) {
        self.files
            .lock()
            .insert(PathBuf::from(path), contents.to_string());
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .keys()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn save(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidLocation("disk full".to_string()));
        }
        let path = PathBuf::from(file_name);
        self.files.lock().insert(
            path.clone(),
            String::from_utf8_lossy(contents).into_owned(),
        );
        Ok(path)
    }

    async fn read(&self, path: &Path) -> Result<String, StorageError> {
        self.files.lock().get(path).cloned().ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.display().to_string(),
            ))
        })
    }
}
