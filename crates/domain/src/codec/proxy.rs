//! Raw views of captured traffic and repeater seeding.

use url::Url;

use crate::error::{DomainError, DomainResult};
use crate::proxy_log::ProxyLog;
use crate::request::{Protocol, TabSeed};
use crate::response::HeaderMap;

fn header_block(headers: Option<&HeaderMap>) -> Option<String> {
    headers.filter(|h| !h.is_empty()).map(|h| {
        h.iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Raw request text of a captured exchange.
#[must_use]
pub fn format_proxy_request(log: &ProxyLog) -> String {
    let mut parts = vec![format!(
        "{} {} HTTP/1.1",
        log.effective_method(),
        log.effective_url()
    )];
    parts.extend(header_block(log.request_headers()));
    parts.push(String::new());
    parts.extend(log.request_content().map(str::to_string));
    parts.join("\n")
}

/// Raw response text of a captured exchange.
#[must_use]
pub fn format_proxy_response(log: &ProxyLog) -> String {
    let status = log
        .response
        .as_ref()
        .map(|r| r.status_code.to_string())
        .or_else(|| log.status.map(|s| s.to_string()))
        .unwrap_or_default();

    let mut parts = vec![format!("HTTP/1.1 {status}")];
    parts.extend(header_block(log.response.as_ref().map(|r| &r.headers)));
    parts.push(String::new());
    parts.extend(
        log.response
            .as_ref()
            .and_then(|r| r.content.as_deref())
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    );
    parts.join("\n")
}

/// Host name of a URL, or empty if it does not parse.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Builds the seed for a repeater tab from a captured exchange.
///
/// The request line targets the URL's path and query; scheme, host and port
/// come from the URL.
///
/// # Errors
///
/// Returns an error if the URL does not parse, has no host, or uses a scheme
/// other than http/https.
pub fn repeater_seed_from_log(log: &ProxyLog) -> DomainResult<TabSeed> {
    let raw_url = log.effective_url();
    let url = Url::parse(raw_url).map_err(|e| DomainError::InvalidUrl(format!("{raw_url}: {e}")))?;
    let protocol: Protocol = url.scheme().parse()?;
    let host = url
        .host_str()
        .ok_or_else(|| DomainError::InvalidUrl(format!("{raw_url}: missing host")))?
        .to_string();
    let port = url
        .port()
        .map_or_else(|| protocol.default_port().to_string(), |p| p.to_string());

    let target = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    let method = log.effective_method().to_string();

    let mut headers = format!("{method} {target} HTTP/1.1");
    if let Some(block) = header_block(log.request_headers()) {
        headers.push('\n');
        headers.push_str(&block);
    }

    Ok(TabSeed {
        method: Some(method),
        url: Some(raw_url.to_string()),
        headers: Some(headers),
        body: Some(log.request_content().unwrap_or_default().to_string()),
        protocol: Some(protocol),
        port: Some(port),
        host: Some(host),
        follow_redirects: None,
    })
}
