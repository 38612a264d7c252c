//! Response returned by the replay endpoint.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered header map; iteration follows insertion order.
pub type HeaderMap = IndexMap<String, String>;

/// Response stored on a tab after a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeaterResponse {
    /// Status code.
    pub status: u16,
    /// Status text; the stringified status when the backend sent none.
    pub status_text: String,
    /// Response headers in the order received.
    #[serde(default)]
    pub headers: HeaderMap,
    /// Response body.
    #[serde(default)]
    pub body: String,
}

impl RepeaterResponse {
    /// Builds a response, filling in missing parts with their defaults.
    #[must_use]
    pub fn from_parts(
        status: u16,
        status_text: Option<String>,
        headers: Option<HeaderMap>,
        body: Option<String>,
    ) -> Self {
        Self {
            status,
            status_text: status_text.unwrap_or_else(|| status.to_string()),
            headers: headers.unwrap_or_default(),
            body: body.unwrap_or_default(),
        }
    }
}
