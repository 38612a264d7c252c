//! Captured proxy traffic records.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::response::HeaderMap;

/// Status of a captured exchange: a response code, or a marker while the
/// exchange is incomplete or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyLogStatus {
    /// Response status code.
    Code(u16),
    /// Waiting for the upstream response.
    Pending,
    /// The exchange failed.
    Error,
}

impl ProxyLogStatus {
    /// Sort rank: codes rank by value, then absent (-1), pending (-2), error (-3).
    #[must_use]
    pub fn rank(status: Option<Self>) -> i32 {
        match status {
            Some(Self::Code(code)) => i32::from(code),
            None => -1,
            Some(Self::Pending) => -2,
            Some(Self::Error) => -3,
        }
    }
}

impl fmt::Display for ProxyLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Pending => f.write_str("pending"),
            Self::Error => f.write_str("error"),
        }
    }
}

impl Serialize for ProxyLogStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Code(code) => serializer.serialize_u16(*code),
            Self::Pending => serializer.serialize_str("pending"),
            Self::Error => serializer.serialize_str("error"),
        }
    }
}

impl<'de> Deserialize<'de> for ProxyLogStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u16),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Ok(Self::Code(code)),
            Raw::Marker(marker) => match marker.as_str() {
                "pending" => Ok(Self::Pending),
                "error" => Ok(Self::Error),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a status code, \"pending\" or \"error\"",
                )),
            },
        }
    }
}

/// Request half of a captured exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRequest {
    /// Method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Headers in capture order.
    #[serde(default)]
    pub headers: HeaderMap,
    /// Body, if any.
    #[serde(default)]
    pub content: Option<String>,
}

/// Response half of a captured exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// Status code.
    pub status_code: u16,
    /// Headers in capture order.
    #[serde(default)]
    pub headers: HeaderMap,
    /// Body, if any.
    #[serde(default)]
    pub content: Option<String>,
}

/// One intercepted exchange as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyLog {
    /// Backend sequence number.
    pub id: u64,
    /// Capture time (ISO-8601).
    pub timestamp: String,
    /// Method; may be omitted when the nested request carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// URL; may be omitted when the nested request carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Exchange status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProxyLogStatus>,
    /// Response size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    /// Captured request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<CapturedRequest>,
    /// Captured response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<CapturedResponse>,
    /// Upstream failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyLog {
    /// Method from the top level, else from the nested request.
    #[must_use]
    pub fn effective_method(&self) -> &str {
        self.method
            .as_deref()
            .or_else(|| self.request.as_ref().map(|r| r.method.as_str()))
            .unwrap_or_default()
    }

    /// URL from the top level, else from the nested request.
    #[must_use]
    pub fn effective_url(&self) -> &str {
        self.url
            .as_deref()
            .or_else(|| self.request.as_ref().map(|r| r.url.as_str()))
            .unwrap_or_default()
    }

    /// Request headers, if captured.
    #[must_use]
    pub fn request_headers(&self) -> Option<&HeaderMap> {
        self.request.as_ref().map(|r| &r.headers)
    }

    /// Request body, if captured and non-empty.
    #[must_use]
    pub fn request_content(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.content.as_deref())
            .filter(|c| !c.is_empty())
    }
}
