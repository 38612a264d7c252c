//! Backend settings.

use std::sync::Arc;

use parking_lot::Mutex;
use snare_domain::{LogSource, ProxySettings, SettingsPatch};
use tracing::{debug, warn};

use crate::events::EventBus;
use crate::ports::{ApiResult, SettingsApi, StatusReporter};

/// Reads and updates the proxy backend's settings.
pub struct SettingsService {
    api: Arc<dyn SettingsApi>,
    status: Arc<dyn StatusReporter>,
    events: EventBus,
    current: Mutex<Option<ProxySettings>>,
}

impl SettingsService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        api: Arc<dyn SettingsApi>,
        status: Arc<dyn StatusReporter>,
        events: EventBus,
    ) -> Self {
        Self {
            api,
            status,
            events,
            current: Mutex::new(None),
        }
    }

    /// Last settings read from or written to the backend.
    #[must_use]
    pub fn current(&self) -> Option<ProxySettings> {
        self.current.lock().clone()
    }

    /// Fetches the settings.
    ///
    /// # Errors
    /// Returns the backend error after reporting `Failed to fetch settings`.
    pub async fn load(&self) -> ApiResult<ProxySettings> {
        match self.api.get_settings().await {
            Ok(settings) => {
                *self.current.lock() = Some(settings.clone());
                Ok(settings)
            }
            Err(error) => {
                warn!(%error, "fetching settings failed");
                self.status.error("Failed to fetch settings");
                Err(error)
            }
        }
    }

    /// Sends a partial update and keeps the settings the backend returns.
    ///
    /// # Errors
    /// Returns the backend error after reporting `Failed to save settings`.
    pub async fn save(&self, patch: &SettingsPatch) -> ApiResult<ProxySettings> {
        match self.api.update_settings(patch).await {
            Ok(settings) => {
                let json = serde_json::to_string(patch).unwrap_or_default();
                debug!(patch = %json, "settings updated");
                let message = format!("Settings updated: {json}");
                self.events.info(LogSource::Settings, message, None);
                *self.current.lock() = Some(settings.clone());
                self.status.success("Settings saved successfully");
                Ok(settings)
            }
            Err(error) => {
                warn!(%error, "updating settings failed");
                self.events.error(
                    LogSource::Settings,
                    format!("Failed to update settings: {error}"),
                    None,
                );
                self.status.error("Failed to save settings");
                Err(error)
            }
        }
    }
}
