//! Control API client using reqwest.
//!
//! This adapter implements the backend API ports over HTTP. Control calls
//! share one client with a short timeout; replayed requests use a second
//! client with a longer one, since the backend waits on the target server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snare_application::ports::{
    ApiError, ApiResult, LogApi, RepeaterApi, ReplayReply, SessionApi, SettingsApi,
};
use snare_domain::{ProxyLog, ProxySettings, ReplayPayload, SessionArtifact, SettingsPatch};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, ConfigError};

/// User agent sent to the control API.
const USER_AGENT: &str = concat!("Snare-Proxy/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct LogsEnvelope {
    data: Vec<ProxyLog>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// HTTP implementation of every backend port.
pub struct ReqwestBackend {
    api: Client,
    replay: Client,
    base_url: Url,
}

impl ReqwestBackend {
    /// Creates both clients from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or a client cannot be
    /// built.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url()?;
        Ok(Self {
            api: build_client(USER_AGENT, config.api_timeout)?,
            replay: build_client(USER_AGENT, config.replay_timeout)?,
            base_url,
        })
    }

    /// Base URL every path is appended to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    fn request(&self, client: &Client, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, "API request");
        client.request(method, url)
    }

    /// Sends a request and turns non-2xx answers into `ApiError::Backend`.
    async fn execute(builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let detail = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail);
        warn!(status = status.as_u16(), detail = ?detail, "API error");
        Err(ApiError::Backend {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let body = response.bytes().await.map_err(map_error)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::ClientBuild(e.to_string()))
}

/// Maps reqwest errors onto the port's error kinds.
fn map_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else if error.is_connect() {
        ApiError::Unreachable
    } else if error.is_decode() {
        ApiError::InvalidResponse(error.to_string())
    } else {
        ApiError::Other(error.to_string())
    }
}

#[async_trait]
impl LogApi for ReqwestBackend {
    async fn fetch_logs(&self) -> ApiResult<Vec<ProxyLog>> {
        let response = Self::execute(self.request(&self.api, Method::GET, "/proxy/logs")).await?;
        let envelope: LogsEnvelope = Self::decode(response).await?;
        Ok(envelope.data)
    }

    async fn clear_logs(&self) -> ApiResult<()> {
        Self::execute(self.request(&self.api, Method::POST, "/proxy/clear")).await?;
        Ok(())
    }

    async fn delete_log(&self, id: u64) -> ApiResult<()> {
        let path = format!("/proxy/logs/{id}");
        Self::execute(self.request(&self.api, Method::DELETE, &path)).await?;
        Ok(())
    }
}

#[async_trait]
impl RepeaterApi for ReqwestBackend {
    async fn send(&self, payload: &ReplayPayload) -> ApiResult<ReplayReply> {
        let builder = self
            .request(&self.replay, Method::POST, "/repeater/send")
            .json(payload);
        Self::decode(Self::execute(builder).await?).await
    }
}

#[async_trait]
impl SessionApi for ReqwestBackend {
    async fn export_session(&self) -> ApiResult<SessionArtifact> {
        let response =
            Self::execute(self.request(&self.api, Method::POST, "/session/export")).await?;
        Self::decode(response).await
    }

    async fn import_session(&self, artifact: &SessionArtifact) -> ApiResult<()> {
        let builder = self
            .request(&self.api, Method::POST, "/session/import")
            .json(artifact);
        Self::execute(builder).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsApi for ReqwestBackend {
    async fn get_settings(&self) -> ApiResult<ProxySettings> {
        Self::decode(Self::execute(self.request(&self.api, Method::GET, "/settings")).await?).await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> ApiResult<ProxySettings> {
        let builder = self
            .request(&self.api, Method::POST, "/settings")
            .json(patch);
        Self::decode(Self::execute(builder).await?).await
    }
}
