//! Backend API ports
//!
//! The control backend exposes captured traffic, the replay endpoint,
//! session snapshots and settings. Each concern gets its own trait so
//! services depend only on what they call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snare_domain::{
    HeaderMap, ProxyLog, ProxySettings, RepeaterResponse, ReplayPayload, SessionArtifact,
    SettingsPatch,
};
use thiserror::Error;

/// Errors returned by backend calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The caller aborted the request.
    #[error("Request cancelled")]
    Cancelled,

    /// No response within the client timeout.
    #[error("Request timed out. Please check your connection.")]
    Timeout,

    /// The backend could not be reached.
    #[error("Unable to connect to API. Please check if the server is running.")]
    Unreachable,

    /// The backend answered with a non-success status.
    #[error("API Error: {}", detail.as_deref().unwrap_or("request failed"))]
    Backend {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, if any.
        detail: Option<String>,
    },

    /// The backend answered with a body that could not be decoded.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Returns true if the request was aborted by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Raw `detail` from the backend error body.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Backend { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The error's message, or `fallback` if it renders empty.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// Result type for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Reply of the replay endpoint. Only `status` is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReply {
    /// Status code.
    pub status: u16,
    /// Status text.
    #[serde(default, rename = "statusText")]
    pub status_text: Option<String>,
    /// Headers.
    #[serde(default)]
    pub headers: Option<HeaderMap>,
    /// Body.
    #[serde(default)]
    pub body: Option<String>,
}

impl ReplayReply {
    /// Converts into the response stored on a tab, filling defaults.
    #[must_use]
    pub fn into_response(self) -> RepeaterResponse {
        RepeaterResponse::from_parts(self.status, self.status_text, self.headers, self.body)
    }
}

/// Captured traffic endpoints.
#[async_trait]
pub trait LogApi: Send + Sync {
    /// Fetches every captured log.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn fetch_logs(&self) -> ApiResult<Vec<ProxyLog>>;

    /// Removes every captured log.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn clear_logs(&self) -> ApiResult<()>;

    /// Removes one captured log.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn delete_log(&self, id: u64) -> ApiResult<()>;
}

/// Replay endpoint.
#[async_trait]
pub trait RepeaterApi: Send + Sync {
    /// Sends a request through the backend.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn send(&self, payload: &ReplayPayload) -> ApiResult<ReplayReply>;
}

/// Session snapshot endpoints.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Exports the current logs and settings.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn export_session(&self) -> ApiResult<SessionArtifact>;

    /// Replaces the backend state with a snapshot.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn import_session(&self, artifact: &SessionArtifact) -> ApiResult<()>;
}

/// Settings endpoints.
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// Reads the current settings.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn get_settings(&self) -> ApiResult<ProxySettings>;

    /// Applies a partial update and returns the resulting settings.
    ///
    /// # Errors
    /// Returns an `ApiError` if the call fails.
    async fn update_settings(&self, patch: &SettingsPatch) -> ApiResult<ProxySettings>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ApiError::Timeout.to_string(),
            "Request timed out. Please check your connection."
        );
        assert_eq!(
            ApiError::Unreachable.to_string(),
            "Unable to connect to API. Please check if the server is running."
        );
        let backend = ApiError::Backend {
            status: 400,
            detail: Some("bad host".to_string()),
        };
        assert_eq!(backend.to_string(), "API Error: bad host");
        assert_eq!(backend.detail(), Some("bad host"));
        assert!(ApiError::Cancelled.is_cancelled());
        assert!(ApiError::Timeout.detail().is_none());
    }

    #[test]
    fn test_message_or_falls_back_on_empty() {
        assert_eq!(
            ApiError::Other(String::new()).message_or("fallback"),
            "fallback"
        );
        assert_eq!(
            ApiError::Other("boom".to_string()).message_or("fallback"),
            "boom"
        );
    }

    #[test]
    fn test_replay_reply_defaults() {
        let reply: ReplayReply = serde_json::from_str(r#"{"status": 200}"#).expect("parse");
        let response = reply.into_response();
        assert_eq!(response.status_text, "200");
        assert!(response.headers.is_empty());
        assert_eq!(response.body, "");
    }
}
