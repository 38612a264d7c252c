//! Session artifact export and import.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use snare_domain::{LogSource, Validation, format_timestamp, validate_session};
use tracing::{debug, info, warn};

use crate::error::{ApplicationError, ApplicationResult};
use crate::events::EventBus;
use crate::logs::LogSyncController;
use crate::ports::{ArtifactStore, Clock, SessionApi, StatusReporter};

/// Shown when a parsed file is not a session artifact.
pub const INVALID_SESSION: &str = "Invalid session data structure";

/// Saves backend snapshots to files and loads them back.
pub struct SessionTransfer {
    api: Arc<dyn SessionApi>,
    artifacts: Arc<dyn ArtifactStore>,
    status: Arc<dyn StatusReporter>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    logs: Arc<LogSyncController>,
}

impl SessionTransfer {
    /// Creates a transfer service. `logs` is refreshed after each import.
    #[must_use]
    pub fn new(
        api: Arc<dyn SessionApi>,
        artifacts: Arc<dyn ArtifactStore>,
        status: Arc<dyn StatusReporter>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        logs: Arc<LogSyncController>,
    ) -> Self {
        Self {
            api,
            artifacts,
            status,
            clock,
            events,
            logs,
        }
    }

    /// Writes the backend snapshot as pretty JSON to
    /// `snare-session-{timestamp}.json`.
    ///
    /// # Errors
    /// Returns the backend or storage error after reporting it.
    pub async fn export_artifact(&self) -> ApplicationResult<PathBuf> {
        match self.write_snapshot().await {
            Ok(path) => {
                info!(path = %path.display(), "session exported");
                self.status.success("Session exported successfully");
                Ok(path)
            }
            Err(error) => {
                warn!(%error, "session export failed");
                self.events.error(
                    LogSource::System,
                    format!("Failed to export session: {error}"),
                    None,
                );
                self.status.error("Failed to export session");
                Err(error)
            }
        }
    }

    async fn write_snapshot(&self) -> ApplicationResult<PathBuf> {
        let artifact = self.api.export_session().await?;
        self.events
            .info(LogSource::System, "Session exported", None);

        let json = serde_json::to_vec_pretty(&artifact)?;
        let name = session_file_name(&format_timestamp(self.clock.now()));
        Ok(self.artifacts.save(&name, &json).await?)
    }

    /// Validates and uploads a session artifact, then refreshes the logs.
    ///
    /// Content that fails validation never reaches the backend.
    ///
    /// # Errors
    /// `InvalidJson` for unparsable text, `Invalid` for a failed structural
    /// check, or the backend error.
    pub async fn import_artifact(&self, content: &str) -> ApplicationResult<()> {
        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(error) => {
                debug!(%error, "session file is not JSON");
                self.status.error("Invalid JSON format");
                return Err(error.into());
            }
        };

        let artifact = match validate_session(&value) {
            Validation::Valid(artifact) => artifact,
            Validation::Invalid(reason) => {
                debug!(%reason, "session file rejected");
                self.status.error(INVALID_SESSION);
                return Err(ApplicationError::Invalid(reason));
            }
        };

        if let Err(error) = self.api.import_session(&artifact).await {
            warn!(%error, "session import failed");
            self.events.error(
                LogSource::System,
                format!("Failed to import session: {error}"),
                None,
            );
            self.status
                .error(&error.message_or("Failed to import session"));
            return Err(error.into());
        }

        self.events
            .info(LogSource::System, "Session imported", None);
        info!(logs = artifact.logs.len(), "session imported");
        self.logs.refresh().await;
        self.status.success("Session imported successfully");
        Ok(())
    }

    /// Reads a session file and imports it.
    ///
    /// # Errors
    /// Returns the storage error if the file cannot be read, otherwise as
    /// [`import_artifact`](Self::import_artifact).
    pub async fn import_file(&self, path: &Path) -> ApplicationResult<()> {
        let content = match self.artifacts.read(path).await {
            Ok(content) => content,
            Err(error) => {
                warn!(%error, path = %path.display(), "reading session file failed");
                self.status.error("Failed to import session");
                return Err(error.into());
            }
        };
        self.import_artifact(&content).await
    }
}

fn session_file_name(timestamp: &str) -> String {
    format!("snare-session-{timestamp}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ApiError, LogApi, ViewContext};
    use crate::test_support::{FixedClock, FlagView, MemoryArtifacts, MockBackend, RecordingStatus};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use snare_domain::{LogEntry, LogType, SessionArtifact};

    struct Fixture {
        backend: Arc<MockBackend>,
        artifacts: Arc<MemoryArtifacts>,
        status: Arc<RecordingStatus>,
        logs: Arc<LogSyncController>,
        transfer: SessionTransfer,
        events: Arc<Mutex<Vec<LogEntry>>>,
        _sub: crate::events::Subscription,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MockBackend::new());
        let artifacts = Arc::new(MemoryArtifacts::default());
        let status = Arc::new(RecordingStatus::default());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_millis(1_700_000_000_000));
        let bus = EventBus::new(Arc::clone(&clock));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let sub = bus.subscribe(move |e| sink.lock().push(e.clone()));

        let logs = LogSyncController::new(
            Arc::clone(&backend) as Arc<dyn LogApi>,
            Arc::clone(&status) as Arc<dyn StatusReporter>,
            Arc::new(FlagView::new(true)) as Arc<dyn ViewContext>,
            Arc::clone(&clock),
            bus.clone(),
        );
        let transfer = SessionTransfer::new(
            Arc::clone(&backend) as Arc<dyn SessionApi>,
            Arc::clone(&artifacts) as Arc<dyn ArtifactStore>,
            Arc::clone(&status) as Arc<dyn StatusReporter>,
            clock,
            bus,
            Arc::clone(&logs),
        );
        Fixture {
            backend,
            artifacts,
            status,
            logs,
            transfer,
            events,
            _sub: sub,
        }
    }

    fn session_json() -> Value {
        json!({
            "logs": [{
                "id": 3,
                "timestamp": "2024-03-20T10:00:00Z",
                "method": "GET",
                "url": "http://example.com/a",
                "status": 200,
                "request": {
                    "method": "GET",
                    "url": "http://example.com/a",
                    "headers": {"Accept": "*/*"},
                    "content": null
                }
            }],
            "settings": {
                "proxy_port": 8080,
                "ui_port": 3001,
                "debug_level": "INFO",
                "enable_filtering": false,
                "filter_rules": [],
                "upstream_proxy_enabled": false,
                "upstream_proxy_host": null,
                "upstream_proxy_port": null,
                "upstream_proxy_auth": false,
                "upstream_proxy_username": null,
                "upstream_proxy_password": null
            },
            "timestamp": "2024-03-20T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_export_writes_pretty_snapshot() {
        let f = fixture();
        let path = f.transfer.export_artifact().await.expect("export");

        assert_eq!(
            path.to_str(),
            Some("snare-session-2023-11-14T22:13:20.000Z.json")
        );
        let written = f.artifacts.contents(&path).expect("written");
        assert!(written.contains("\n  \"logs\""));
        let artifact: SessionArtifact = serde_json::from_str(&written).expect("artifact");
        assert_eq!(artifact.timestamp, "2024-03-20T10:00:00Z");
        assert_eq!(
            f.status.last_success().as_deref(),
            Some("Session exported successfully")
        );

        let events = f.events.lock();
        assert_eq!(events[0].message, "Session exported");
        assert_eq!(events[0].source, LogSource::System);
    }

    #[tokio::test]
    async fn test_export_failure_is_reported_generically() {
        let f = fixture();
        f.backend.export_with(Err(ApiError::Unreachable));

        assert!(f.transfer.export_artifact().await.is_err());
        assert_eq!(
            f.status.last_error().as_deref(),
            Some("Failed to export session")
        );
        assert!(f.artifacts.names().is_empty());
        let events = f.events.lock();
        assert_eq!(events[0].log_type, LogType::Error);
        assert!(events[0].message.starts_with("Failed to export session: "));
    }

    #[tokio::test]
    async fn test_import_uploads_then_refreshes_logs() {
        let f = fixture();
        f.transfer
            .import_artifact(&session_json().to_string())
            .await
            .expect("import");

        assert_eq!(f.backend.imported().len(), 1);
        assert_eq!(f.backend.fetch_calls(), 1);
        let ids: Vec<u64> = f.logs.logs().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3]);
        assert_eq!(
            f.status.last_success().as_deref(),
            Some("Session imported successfully")
        );
        assert!(
            f.events
                .lock()
                .iter()
                .any(|e| e.message == "Session imported")
        );
    }

    #[tokio::test]
    async fn test_string_log_id_never_reaches_backend() {
        let f = fixture();
        let mut session = session_json();
        session["logs"][0]["id"] = json!("3");

        let err = f
            .transfer
            .import_artifact(&session.to_string())
            .await
            .expect_err("rejected");
        assert!(matches!(err, ApplicationError::Invalid(_)));
        assert_eq!(f.status.last_error().as_deref(), Some(INVALID_SESSION));
        assert!(f.backend.imported().is_empty());
        assert_eq!(f.backend.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_content() {
        let f = fixture();
        let err = f
            .transfer
            .import_artifact("{\"logs\": [")
            .await
            .expect_err("rejected");
        assert!(matches!(err, ApplicationError::InvalidJson(_)));
        assert_eq!(
            f.status.last_error().as_deref(),
            Some("Invalid JSON format")
        );
        assert!(f.backend.imported().is_empty());
    }

    #[tokio::test]
    async fn test_backend_rejection_surfaces_message() {
        let f = fixture();
        f.backend.fail_import(ApiError::Backend {
            status: 422,
            detail: Some("Unsupported session version".to_string()),
        });

        assert!(
            f.transfer
                .import_artifact(&session_json().to_string())
                .await
                .is_err()
        );
        assert_eq!(
            f.status.last_error().as_deref(),
            Some("API Error: Unsupported session version")
        );
        assert_eq!(f.backend.fetch_calls(), 0);
        assert!(f.status.successes().is_empty());
    }

    #[tokio::test]
    async fn test_import_file_reads_through_store() {
        let f = fixture();
        f.artifacts
            .insert("saved.json", &session_json().to_string());

        f.transfer
            .import_file(Path::new("saved.json"))
            .await
            .expect("import");
        assert_eq!(f.backend.imported().len(), 1);

        assert!(
            f.transfer
                .import_file(Path::new("missing.json"))
                .await
                .is_err()
        );
        assert_eq!(
            f.status.last_error().as_deref(),
            Some("Failed to import session")
        );
    }
}
