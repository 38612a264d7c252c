//! Wire payload for the replay endpoint.

use serde::{Deserialize, Serialize};

use super::{RepeaterRequest, RequestConfig, build_target_url};

/// Body of `POST /repeater/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayPayload {
    /// Method taken from the request line.
    pub method: String,
    /// Target URL built from the tab config.
    pub url: String,
    /// Raw header block, forwarded untouched.
    pub headers: String,
    /// Request body.
    pub body: String,
    /// Redirect policy.
    pub follow_redirects: bool,
}

/// Formats a tab's request and config into the replay payload.
///
/// The header block is forwarded exactly as edited; the method comes from
/// its first line and the URL from the config.
#[must_use]
pub fn format_request_for_api(request: &RepeaterRequest, config: &RequestConfig) -> ReplayPayload {
    ReplayPayload {
        method: request.request_line_method().to_string(),
        url: build_target_url(config, "/"),
        headers: request.headers.clone(),
        body: request.body.clone(),
        follow_redirects: config.follow_redirects,
    }
}
