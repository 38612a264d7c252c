//! Filtering and ordering of debug log entries and captured traffic.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::log_entry::EnhancedLogEntry;
use crate::proxy_log::{ProxyLog, ProxyLogStatus};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::InvalidIdentifier(other.to_string())),
        }
    }
}

/// Column of the debug log used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSortField {
    /// Display id.
    #[default]
    Id,
    /// Time.
    Timestamp,
    /// Producer.
    Source,
    /// Kind.
    Type,
    /// Method.
    Method,
    /// URL, falling back to the message.
    Url,
    /// Status.
    Status,
}

impl FromStr for LogSortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "timestamp" => Ok(Self::Timestamp),
            "source" => Ok(Self::Source),
            "type" => Ok(Self::Type),
            "method" => Ok(Self::Method),
            "url" => Ok(Self::Url),
            "status" => Ok(Self::Status),
            other => Err(DomainError::InvalidIdentifier(other.to_string())),
        }
    }
}

/// Column of the traffic table used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxySortColumn {
    /// Backend id.
    #[default]
    Id,
    /// Capture time.
    Timestamp,
    /// Method.
    Method,
    /// URL.
    Url,
    /// Status.
    Status,
    /// Response size.
    ContentLength,
}

impl FromStr for ProxySortColumn {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "timestamp" => Ok(Self::Timestamp),
            "method" => Ok(Self::Method),
            "url" => Ok(Self::Url),
            "status" => Ok(Self::Status),
            "content_length" => Ok(Self::ContentLength),
            other => Err(DomainError::InvalidIdentifier(other.to_string())),
        }
    }
}

/// Per-column substring filters for the debug log. Empty fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Method contains (case-insensitive).
    pub method: Option<String>,
    /// URL contains (case-insensitive).
    pub url: Option<String>,
    /// Status text contains.
    pub status: Option<String>,
    /// Type contains (case-insensitive).
    pub log_type: Option<String>,
    /// Source contains (case-insensitive).
    pub source: Option<String>,
}

impl FilterOptions {
    fn is_empty(&self) -> bool {
        [
            &self.method,
            &self.url,
            &self.status,
            &self.log_type,
            &self.source,
        ]
        .iter()
        .all(|f| f.as_deref().is_none_or(str::is_empty))
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    needle
        .filter(|n| !n.is_empty())
        .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

fn timestamp_millis(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp).map_or(0, |t| t.timestamp_millis())
}

/// Keeps entries matching the quick filter (message or URL) and every
/// column filter.
#[must_use]
pub fn filter_logs(
    logs: &[EnhancedLogEntry],
    quick_filter: &str,
    options: &FilterOptions,
) -> Vec<EnhancedLogEntry> {
    if quick_filter.is_empty() && options.is_empty() {
        return logs.to_vec();
    }

    let quick = quick_filter.to_lowercase();
    logs.iter()
        .filter(|log| {
            let entry = &log.entry;
            let url = entry.detail_url().unwrap_or_default();
            let status = entry
                .detail_status()
                .map(|s| s.to_string())
                .unwrap_or_default();

            let matches_quick = quick.is_empty()
                || entry.message.to_lowercase().contains(&quick)
                || url.to_lowercase().contains(&quick);

            matches_quick
                && contains_ci(
                    entry.detail_method().unwrap_or_default(),
                    options.method.as_deref(),
                )
                && contains_ci(url, options.url.as_deref())
                && options
                    .status
                    .as_deref()
                    .is_none_or(|needle| status.contains(needle))
                && contains_ci(entry.log_type.as_str(), options.log_type.as_deref())
                && contains_ci(entry.source.as_str(), options.source.as_deref())
        })
        .cloned()
        .collect()
}

/// Returns the entries ordered by a column. The sort is stable.
#[must_use]
pub fn sort_logs(
    logs: &[EnhancedLogEntry],
    field: LogSortField,
    direction: SortDirection,
) -> Vec<EnhancedLogEntry> {
    let mut sorted = logs.to_vec();
    sorted.sort_by(|a, b| {
        let (ea, eb) = (&a.entry, &b.entry);
        let ordering = match field {
            LogSortField::Id => a.display_id().cmp(&b.display_id()),
            LogSortField::Timestamp => {
                timestamp_millis(&ea.timestamp).cmp(&timestamp_millis(&eb.timestamp))
            }
            LogSortField::Source => ea.source.as_str().cmp(eb.source.as_str()),
            LogSortField::Type => ea.log_type.as_str().cmp(eb.log_type.as_str()),
            LogSortField::Method => ea
                .detail_method()
                .unwrap_or_default()
                .cmp(eb.detail_method().unwrap_or_default()),
            LogSortField::Url => ea
                .detail_url()
                .unwrap_or(&ea.message)
                .cmp(eb.detail_url().unwrap_or(&eb.message)),
            LogSortField::Status => ProxyLogStatus::rank(ea.detail_status())
                .cmp(&ProxyLogStatus::rank(eb.detail_status())),
        };
        direction.apply(ordering)
    });
    sorted
}

/// Keeps captured logs whose URL or method contains the filter
/// (case-insensitive).
#[must_use]
pub fn filter_proxy_logs(logs: &[ProxyLog], filter: &str) -> Vec<ProxyLog> {
    let needle = filter.to_lowercase();
    logs.iter()
        .filter(|log| {
            log.effective_url().to_lowercase().contains(&needle)
                || log.effective_method().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Returns captured logs ordered by a column. The sort is stable.
#[must_use]
pub fn sort_proxy_logs(
    logs: &[ProxyLog],
    column: ProxySortColumn,
    direction: SortDirection,
) -> Vec<ProxyLog> {
    let mut sorted = logs.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = match column {
            ProxySortColumn::Id => a.id.cmp(&b.id),
            ProxySortColumn::Timestamp => {
                timestamp_millis(&a.timestamp).cmp(&timestamp_millis(&b.timestamp))
            }
            ProxySortColumn::Method => a.effective_method().cmp(b.effective_method()),
            ProxySortColumn::Url => a.effective_url().cmp(b.effective_url()),
            ProxySortColumn::Status => {
                ProxyLogStatus::rank(a.status).cmp(&ProxyLogStatus::rank(b.status))
            }
            ProxySortColumn::ContentLength => a
                .content_length
                .unwrap_or(0)
                .cmp(&b.content_length.unwrap_or(0)),
        };
        direction.apply(ordering)
    });
    sorted
}
