//! Partial values used to seed a new tab.

use serde::{Deserialize, Serialize};

use super::{Protocol, RepeaterRequest, RequestConfig};

/// Optional request and config values merged over the defaults when a tab
/// is created (for example when a captured request is sent to the repeater).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabSeed {
    /// Method override.
    pub method: Option<String>,
    /// URL override.
    pub url: Option<String>,
    /// Raw header block override.
    pub headers: Option<String>,
    /// Body override.
    pub body: Option<String>,
    /// Protocol override.
    pub protocol: Option<Protocol>,
    /// Port override.
    pub port: Option<String>,
    /// Host override; also becomes the tab's domain.
    pub host: Option<String>,
    /// Redirect policy override.
    pub follow_redirects: Option<bool>,
}

impl TabSeed {
    /// Builds the request half of the seed over the default request.
    #[must_use]
    pub fn to_request(&self) -> RepeaterRequest {
        let defaults = RepeaterRequest::default();
        RepeaterRequest {
            method: self.method.clone().unwrap_or(defaults.method),
            url: self.url.clone().unwrap_or(defaults.url),
            headers: self.headers.clone().unwrap_or(defaults.headers),
            body: self.body.clone().unwrap_or(defaults.body),
        }
    }

    /// Builds the config half of the seed over the default config.
    #[must_use]
    pub fn to_config(&self) -> RequestConfig {
        let defaults = RequestConfig::default();
        RequestConfig {
            protocol: self.protocol.unwrap_or(defaults.protocol),
            port: self.port.clone().unwrap_or(defaults.port),
            host: self.host.clone().unwrap_or(defaults.host),
            follow_redirects: self.follow_redirects.unwrap_or(defaults.follow_redirects),
        }
    }

    /// Domain implied by the seed (its host, or empty).
    #[must_use]
    pub fn domain(&self) -> String {
        self.host.clone().unwrap_or_default()
    }
}
