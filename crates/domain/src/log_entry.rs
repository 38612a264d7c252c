//! Unified debug log records.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::proxy_log::{ProxyLog, ProxyLogStatus};
use crate::response::HeaderMap;

/// Severity/kind of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// Informational.
    Info,
    /// Failure.
    Error,
    /// Something worth a look.
    Warning,
    /// An HTTP exchange.
    Request,
}

impl LogType {
    /// Lowercase name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogSource {
    /// Captured proxy traffic.
    Proxy,
    /// Repeater sends.
    Repeater,
    /// Settings changes.
    Settings,
    /// Session and housekeeping events.
    System,
}

impl LogSource {
    /// Name as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proxy => "Proxy",
            Self::Repeater => "Repeater",
            Self::Settings => "Settings",
            Self::System => "System",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional HTTP details attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDetails {
    /// Method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProxyLogStatus>,
    /// Headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HeaderMap>,
    /// Body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// An immutable debug log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique id; backend logs keep their numeric id as a string.
    pub id: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Kind.
    #[serde(rename = "type")]
    pub log_type: LogType,
    /// Producer.
    pub source: LogSource,
    /// Human readable text.
    pub message: String,
    /// HTTP details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<LogDetails>,
}

impl LogEntry {
    /// Creates an entry stamped with the given time.
    #[must_use]
    pub fn new(
        id: String,
        at: DateTime<Utc>,
        log_type: LogType,
        source: LogSource,
        message: impl Into<String>,
        details: Option<LogDetails>,
    ) -> Self {
        Self {
            id,
            timestamp: format_timestamp(at),
            log_type,
            source,
            message: message.into(),
            details,
        }
    }

    /// Builds the Proxy `request` entry mirroring a captured log.
    #[must_use]
    pub fn from_proxy_log(log: &ProxyLog) -> Self {
        let method = log.effective_method().to_string();
        let url = log.effective_url().to_string();
        Self {
            id: log.id.to_string(),
            timestamp: log.timestamp.clone(),
            log_type: LogType::Request,
            source: LogSource::Proxy,
            message: format!("{method} {url}"),
            details: Some(LogDetails {
                method: Some(method),
                url: Some(url),
                status: log.status,
                headers: log.request_headers().cloned(),
                content: log.request_content().map(str::to_string),
            }),
        }
    }

    /// URL from the details, if any.
    #[must_use]
    pub fn detail_url(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.url.as_deref())
    }

    /// Method from the details, if any.
    #[must_use]
    pub fn detail_method(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.method.as_deref())
    }

    /// Status from the details, if any.
    #[must_use]
    pub fn detail_status(&self) -> Option<ProxyLogStatus> {
        self.details.as_ref().and_then(|d| d.status)
    }
}

/// A log entry as held by the debug log view, with display sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedLogEntry {
    /// Underlying entry.
    #[serde(flatten)]
    pub entry: LogEntry,
    /// Position in arrival order, starting at 1.
    pub incremental_id: u64,
    /// Position among Proxy entries, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
}

impl EnhancedLogEntry {
    /// Id used when ordering by id: the proxy sequence for Proxy entries,
    /// the incremental id otherwise.
    #[must_use]
    pub fn display_id(&self) -> u64 {
        if self.entry.source == LogSource::Proxy {
            self.proxy_id
                .as_deref()
                .and_then(|id| id.parse().ok())
                .unwrap_or(0)
        } else {
            self.incremental_id
        }
    }
}

/// Formats a time the way log timestamps are written (millisecond precision, `Z`).
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_entry_serialization_shape() {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid date");
        let entry = LogEntry::new(
            "1-abc".to_string(),
            at,
            LogType::Info,
            LogSource::Settings,
            "saved",
            None,
        );
        let value = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "1-abc",
                "timestamp": "2024-05-01T12:00:00.000Z",
                "type": "info",
                "source": "Settings",
                "message": "saved"
            })
        );
    }

    #[test]
    fn test_from_proxy_log_keeps_backend_id() {
        let log: ProxyLog = serde_json::from_value(json!({
            "id": 42,
            "timestamp": "2024-01-01T00:00:00Z",
            "method": "GET",
            "url": "http://a.com/x",
            "status": 200,
            "request": {"method": "GET", "url": "http://a.com/x", "headers": {"Host": "a.com"}, "content": null}
        }))
        .expect("parse");

        let entry = LogEntry::from_proxy_log(&log);
        assert_eq!(entry.id, "42");
        assert_eq!(entry.log_type, LogType::Request);
        assert_eq!(entry.source, LogSource::Proxy);
        assert_eq!(entry.message, "GET http://a.com/x");
        assert_eq!(entry.detail_status(), Some(ProxyLogStatus::Code(200)));
        assert_eq!(entry.details.as_ref().and_then(|d| d.content.clone()), None);
    }

    #[test]
    fn test_display_id() {
        let entry = LogEntry::new(
            "1".to_string(),
            Utc::now(),
            LogType::Request,
            LogSource::Proxy,
            "GET /",
            None,
        );
        let proxy = EnhancedLogEntry {
            entry: entry.clone(),
            incremental_id: 9,
            proxy_id: Some("3".to_string()),
        };
        assert_eq!(proxy.display_id(), 3);

        let system = EnhancedLogEntry {
            entry: LogEntry {
                source: LogSource::System,
                ..entry
            },
            incremental_id: 9,
            proxy_id: None,
        };
        assert_eq!(system.display_id(), 9);
    }
}
