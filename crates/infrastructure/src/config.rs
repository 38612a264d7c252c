//! Client configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Default control API host.
pub const DEFAULT_API_HOST: &str = "localhost";
/// Default control API port.
pub const DEFAULT_API_PORT: u16 = 8001;
/// Timeout for control API calls.
pub const API_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for replayed requests.
pub const REPLAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `SNARE_API_PORT` is not a port number.
    #[error("SNARE_API_PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),

    /// The host does not form a valid URL.
    #[error("invalid API host: {0}")]
    InvalidHost(String),

    /// No platform config directory and no `SNARE_STATE_DIR`.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Where the control API lives and where local files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Control API host.
    pub api_host: String,
    /// Control API port.
    pub api_port: u16,
    /// Directory for durable UI state.
    pub state_dir: PathBuf,
    /// Directory for exported files.
    pub export_dir: PathBuf,
    /// Timeout for control API calls.
    pub api_timeout: Duration,
    /// Timeout for replayed requests.
    pub replay_timeout: Duration,
}

impl ClientConfig {
    /// Reads `SNARE_API_HOST`, `SNARE_API_PORT`, `SNARE_STATE_DIR` and
    /// `SNARE_EXPORT_DIR`, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    /// Returns an error if a variable holds an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_host = lookup("SNARE_API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        let api_port = match lookup("SNARE_API_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_API_PORT,
        };

        let state_dir = match lookup("SNARE_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|p| p.join("snare"))
                .ok_or(ConfigError::NoConfigDir)?,
        };
        let export_dir = lookup("SNARE_EXPORT_DIR")
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let config = Self {
            api_host,
            api_port,
            state_dir,
            export_dir,
            api_timeout: API_TIMEOUT,
            replay_timeout: REPLAY_TIMEOUT,
        };
        config.base_url()?;
        Ok(config)
    }

    /// `http://{host}:{port}/api`.
    ///
    /// # Errors
    /// Returns an error if the host does not form a valid URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("http://{}:{}/api", self.api_host, self.api_port);
        match Url::parse(&raw) {
            Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
            _ => Err(ConfigError::InvalidHost(self.api_host.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SNARE_API_HOST", "10.0.0.2"),
            ("SNARE_API_PORT", "9000"),
            ("SNARE_STATE_DIR", "/tmp/snare-state"),
            ("SNARE_EXPORT_DIR", "/tmp/snare-out"),
        ]))
        .expect("config");

        assert_eq!(config.api_host, "10.0.0.2");
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/snare-state"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/snare-out"));
        assert_eq!(
            config.base_url().expect("url").as_str(),
            "http://10.0.0.2:9000/api"
        );
    }

    #[test]
    fn test_defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("SNARE_STATE_DIR", "/tmp/s")])).expect("config");
        assert_eq!(config.api_host, "localhost");
        assert_eq!(config.api_port, 8001);
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(config.replay_timeout, Duration::from_secs(30));
        assert_eq!(
            config.base_url().expect("url").as_str(),
            "http://localhost:8001/api"
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("SNARE_API_PORT", "eighty"),
            ("SNARE_STATE_DIR", "/tmp/s"),
        ]))
        .expect_err("rejected");
        assert_eq!(err, ConfigError::InvalidPort("eighty".to_string()));

        let err = ClientConfig::from_lookup(lookup(&[
            ("SNARE_API_PORT", "70000"),
            ("SNARE_STATE_DIR", "/tmp/s"),
        ]))
        .expect_err("rejected");
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn test_invalid_host() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("SNARE_API_HOST", "bad host/"),
            ("SNARE_STATE_DIR", "/tmp/s"),
        ]))
        .expect_err("rejected");
        assert_eq!(err, ConfigError::InvalidHost("bad host/".to_string()));
    }
}
