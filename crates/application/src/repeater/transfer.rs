//! Tabs-only export and import.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::Error as _;
use snare_domain::TabImport;
use tracing::{info, warn};

use super::TabStore;
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{ArtifactStore, StatusReporter};

/// File name used for tab exports.
pub const TABS_FILE_NAME: &str = "repeater-tabs.json";

/// Moves repeater tabs in and out of `repeater-tabs.json` files.
pub struct TabTransfer {
    artifacts: Arc<dyn ArtifactStore>,
    status: Arc<dyn StatusReporter>,
}

impl TabTransfer {
    /// Creates a transfer service.
    #[must_use]
    pub fn new(artifacts: Arc<dyn ArtifactStore>, status: Arc<dyn StatusReporter>) -> Self {
        Self { artifacts, status }
    }

    /// Writes the active tab as a one-element array, or `[]` without one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub async fn export_tabs(&self, store: &TabStore) -> ApplicationResult<PathBuf> {
        let tabs: Vec<_> = store.active_tab().into_iter().collect();
        let json = serde_json::to_vec_pretty(&tabs)?;
        match self.artifacts.save(TABS_FILE_NAME, &json).await {
            Ok(path) => {
                info!(path = %path.display(), count = tabs.len(), "tabs exported");
                Ok(path)
            }
            Err(error) => {
                warn!(%error, "tab export failed");
                self.status.error("Failed to export tabs");
                Err(error.into())
            }
        }
    }

    /// Appends every tab in a JSON array, each under a fresh id.
    ///
    /// Anything other than an array of tab-like objects is rejected with
    /// `Invalid JSON format` and leaves the store untouched.
    ///
    /// # Errors
    /// Returns `ApplicationError::InvalidJson` for malformed content.
    pub fn import_tabs(
        &self,
        store: &mut TabStore,
        content: &str,
    ) -> ApplicationResult<Vec<String>> {
        match parse_tabs(content) {
            Ok(imports) => {
                let ids = store.append_tabs(imports);
                info!(count = ids.len(), "tabs imported");
                self.status.success("Tabs imported successfully");
                Ok(ids)
            }
            Err(error) => {
                warn!(%error, "tab import rejected");
                self.status.error(&error.to_string());
                Err(error)
            }
        }
    }
}

fn parse_tabs(content: &str) -> ApplicationResult<Vec<TabImport>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_array() {
        return Err(ApplicationError::InvalidJson(serde_json::Error::custom(
            "expected an array of tabs",
        )));
    }
    Ok(serde_json::from_value(value)?)
}
