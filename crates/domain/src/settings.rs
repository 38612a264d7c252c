//! Backend proxy settings.

use serde::{Deserialize, Deserializer, Serialize};

/// Settings held by the proxy backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Port the intercepting proxy listens on.
    pub proxy_port: u16,
    /// Port serving the control panel.
    pub ui_port: u16,
    /// Backend log verbosity.
    pub debug_level: String,
    /// Whether filter rules are applied.
    pub enable_filtering: bool,
    /// Host/path filter patterns.
    pub filter_rules: Vec<String>,
    /// Whether traffic is chained through an upstream proxy.
    pub upstream_proxy_enabled: bool,
    /// Upstream proxy host.
    pub upstream_proxy_host: Option<String>,
    /// Upstream proxy port.
    pub upstream_proxy_port: Option<u16>,
    /// Whether the upstream proxy requires credentials.
    pub upstream_proxy_auth: bool,
    /// Upstream proxy user name.
    pub upstream_proxy_username: Option<String>,
    /// Upstream proxy password.
    pub upstream_proxy_password: Option<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            proxy_port: 8080,
            ui_port: 3001,
            debug_level: "INFO".to_string(),
            enable_filtering: false,
            filter_rules: Vec::new(),
            upstream_proxy_enabled: false,
            upstream_proxy_host: None,
            upstream_proxy_port: None,
            upstream_proxy_auth: false,
            upstream_proxy_username: None,
            upstream_proxy_password: None,
        }
    }
}

impl ProxySettings {
    /// Applies a partial update locally.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(port) = patch.proxy_port {
            self.proxy_port = port;
        }
        if let Some(port) = patch.ui_port {
            self.ui_port = port;
        }
        if let Some(level) = &patch.debug_level {
            self.debug_level.clone_from(level);
        }
        if let Some(enabled) = patch.enable_filtering {
            self.enable_filtering = enabled;
        }
        if let Some(rules) = &patch.filter_rules {
            self.filter_rules.clone_from(rules);
        }
        if let Some(enabled) = patch.upstream_proxy_enabled {
            self.upstream_proxy_enabled = enabled;
        }
        if let Some(host) = &patch.upstream_proxy_host {
            self.upstream_proxy_host.clone_from(host);
        }
        if let Some(port) = patch.upstream_proxy_port {
            self.upstream_proxy_port = port;
        }
        if let Some(auth) = patch.upstream_proxy_auth {
            self.upstream_proxy_auth = auth;
        }
        if let Some(username) = &patch.upstream_proxy_username {
            self.upstream_proxy_username.clone_from(username);
        }
        if let Some(password) = &patch.upstream_proxy_password {
            self.upstream_proxy_password.clone_from(password);
        }
    }
}

/// Partial settings update. Absent fields are left untouched; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New proxy port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<u16>,
    /// New UI port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_port: Option<u16>,
    /// New log verbosity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_level: Option<String>,
    /// Toggle filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_filtering: Option<bool>,
    /// Replacement filter rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_rules: Option<Vec<String>>,
    /// Toggle upstream proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_proxy_enabled: Option<bool>,
    /// Upstream host.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub upstream_proxy_host: Option<Option<String>>,
    /// Upstream port.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub upstream_proxy_port: Option<Option<u16>>,
    /// Toggle upstream credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_proxy_auth: Option<bool>,
    /// Upstream user name.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub upstream_proxy_username: Option<Option<String>>,
    /// Upstream password.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub upstream_proxy_password: Option<Option<String>>,
}

impl SettingsPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// Present-but-null must stay distinguishable from absent.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
