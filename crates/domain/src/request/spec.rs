//! Editable request specification.

use serde::{Deserialize, Serialize};

/// User agent placed in the default request template.
pub const DEFAULT_USER_AGENT: &str = "Snare-Proxy";

/// An editable HTTP request held by a repeater tab.
///
/// `headers` is the raw header block exactly as the user edits it,
/// starting with the request line (`GET / HTTP/1.1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeaterRequest {
    /// HTTP method (informational; the request line is authoritative).
    pub method: String,
    /// Optional full URL.
    pub url: String,
    /// Raw header block, request line first.
    pub headers: String,
    /// Request body.
    pub body: String,
}

impl Default for RepeaterRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            headers: format!(
                "GET / HTTP/1.1\nHost: example.com\nUser-Agent: {DEFAULT_USER_AGENT}\nAccept: */*"
            ),
            body: String::new(),
        }
    }
}

impl RepeaterRequest {
    /// Returns the method named on the request line, defaulting to `GET`.
    #[must_use]
    pub fn request_line_method(&self) -> &str {
        self.headers
            .lines()
            .next()
            .and_then(|line| line.split(' ').next())
            .filter(|method| !method.is_empty())
            .unwrap_or("GET")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_template() {
        let request = RepeaterRequest::default();
        assert_eq!(request.method, "GET");
        assert!(request.url.is_empty());
        assert!(request.body.is_empty());

        let lines: Vec<&str> = request.headers.lines().collect();
        assert_eq!(
            lines,
            vec![
                "GET / HTTP/1.1",
                "Host: example.com",
                "User-Agent: Snare-Proxy",
                "Accept: */*",
            ]
        );
    }

    #[test]
    fn test_request_line_method() {
        let mut request = RepeaterRequest::default();
        request.headers = "POST /login HTTP/1.1\nHost: a.com".to_string();
        assert_eq!(request.request_line_method(), "POST");

        request.headers = String::new();
        assert_eq!(request.request_line_method(), "GET");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let request: RepeaterRequest =
            serde_json::from_str(r#"{"body": "x=1"}"#).expect("should parse");
        assert_eq!(request.body, "x=1");
        assert_eq!(request.method, "GET");
        assert!(request.headers.starts_with("GET / HTTP/1.1"));
    }
}
