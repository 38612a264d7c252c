//! cURL command rendering.

use crate::proxy_log::ProxyLog;
use crate::response::HeaderMap;

/// Renders a cURL command for a request.
///
/// Values are wrapped in single quotes without escaping, so a value that
/// itself contains `'` yields a command the shell will misread.
#[must_use]
pub fn build_curl_command(
    method: &str,
    url: &str,
    headers: &HeaderMap,
    body: Option<&str>,
) -> String {
    let mut command = format!("curl -X {method} '{url}'");
    for (key, value) in headers {
        command.push_str(&format!(" -H '{key}: {value}'"));
    }
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        command.push_str(&format!(" -d '{body}'"));
    }
    command
}

/// Renders a cURL command reproducing a captured request.
#[must_use]
pub fn curl_for_log(log: &ProxyLog) -> String {
    let empty = HeaderMap::new();
    build_curl_command(
        log.effective_method(),
        log.effective_url(),
        log.request_headers().unwrap_or(&empty),
        log.request_content(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_build_curl_command() {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("X-Trace".to_string(), "1".to_string());

        assert_eq!(
            build_curl_command("POST", "http://a.com/x", &headers, Some("{\"a\":1}")),
            "curl -X POST 'http://a.com/x' -H 'Content-Type: application/json' -H 'X-Trace: 1' -d '{\"a\":1}'"
        );
    }

    #[test]
    fn test_build_curl_command_skips_empty_body() {
        assert_eq!(
            build_curl_command("GET", "http://a.com/", &HeaderMap::new(), Some("")),
            "curl -X GET 'http://a.com/'"
        );
    }

    #[test]
    fn test_curl_for_log() {
        let log: ProxyLog = serde_json::from_value(json!({
            "id": 1,
            "timestamp": "t",
            "method": "PUT",
            "url": "https://a.com/item",
            "request": {"method": "PUT", "url": "https://a.com/item", "headers": {"Host": "a.com"}, "content": "x=1"}
        }))
        .expect("parse");
        assert_eq!(
            curl_for_log(&log),
            "curl -X PUT 'https://a.com/item' -H 'Host: a.com' -d 'x=1'"
        );
    }
}
