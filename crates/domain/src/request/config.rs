//! Target configuration for a repeater tab.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Scheme used to reach the replay target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Protocol {
    /// Returns the scheme name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Returns the canonical port for the scheme.
    #[must_use]
    pub const fn default_port(&self) -> &'static str {
        match self {
            Self::Http => "80",
            Self::Https => "443",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches(':').to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(DomainError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Where a tab's request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestConfig {
    /// Scheme.
    pub protocol: Protocol,
    /// Port as typed by the user (numeric string).
    pub port: String,
    /// Target host name; empty until configured.
    pub host: String,
    /// Whether the backend should follow redirects.
    pub follow_redirects: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            port: "80".to_string(),
            host: String::new(),
            follow_redirects: false,
        }
    }
}

impl RequestConfig {
    /// Returns true when the port is the canonical one for the protocol.
    #[must_use]
    pub fn uses_default_port(&self) -> bool {
        self.port == self.protocol.default_port()
    }
}

/// Builds the target URL for a config and path.
///
/// Returns an empty string when no host is configured. The port segment is
/// omitted for 80/http and 443/https.
#[must_use]
pub fn build_target_url(config: &RequestConfig, path: &str) -> String {
    if config.host.is_empty() {
        return String::new();
    }

    if config.uses_default_port() {
        format!("{}://{}{}", config.protocol, config.host, path)
    } else {
        format!("{}://{}:{}{}", config.protocol, config.host, config.port, path)
    }
}
