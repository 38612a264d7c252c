//! Request blocks and response text.

use crate::error::{DomainError, DomainResult};
use crate::response::{HeaderMap, RepeaterResponse};

/// A raw request block split into its request line and header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequestBlock {
    /// Method token; empty when the block is empty.
    pub method: String,
    /// Request target; `/` when missing.
    pub path: String,
    /// Protocol version token; empty when missing.
    pub protocol_version: String,
    /// Remaining lines joined with `\n`, unparsed.
    pub header_lines: String,
}

/// Splits a raw request block into its request line fields and the
/// remaining header text.
#[must_use]
pub fn parse_request_block(raw: &str) -> ParsedRequestBlock {
    let (first, rest) = raw.split_once('\n').unwrap_or((raw, ""));
    let mut tokens = first.split(' ');

    ParsedRequestBlock {
        method: tokens.next().unwrap_or_default().to_string(),
        path: tokens.next().unwrap_or("/").to_string(),
        protocol_version: tokens.next().unwrap_or_default().to_string(),
        header_lines: rest.to_string(),
    }
}

/// Parses `Key: value` lines of a request block into an ordered map.
///
/// The first line (the request line) is skipped. Values keep any further
/// colons; blank lines and lines without a colon are ignored.
#[must_use]
pub fn parse_header_lines(block: &str) -> HeaderMap {
    block
        .split('\n')
        .skip(1)
        .map(str::trim)
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Renders a response as raw HTTP text.
///
/// Headers follow the map's order, and exactly one blank line separates
/// them from the body.
#[must_use]
pub fn format_response(response: &RepeaterResponse) -> String {
    let headers = response
        .headers
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "HTTP/1.1 {} {}\n{headers}\n\n{}",
        response.status, response.status_text, response.body
    )
}

/// Structured view of raw response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub status_text: String,
    /// Headers in order.
    pub headers: HeaderMap,
    /// Body.
    pub body: String,
}

/// Parses text produced by [`format_response`].
///
/// # Errors
///
/// Returns `DomainError::MalformedMessage` if the status line has no
/// numeric status code.
pub fn parse_response_block(raw: &str) -> DomainResult<ParsedResponse> {
    let (status_line, rest) = raw.split_once('\n').unwrap_or((raw, ""));

    let mut tokens = status_line.splitn(3, ' ');
    let _version = tokens.next();
    let status = tokens
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| DomainError::MalformedMessage(format!("bad status line: {status_line}")))?;
    let status_text = tokens.next().unwrap_or_default().to_string();

    let (header_text, body) = rest.split_once("\n\n").unwrap_or((rest, ""));
    let headers = header_text
        .split('\n')
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    Ok(ParsedResponse {
        status,
        status_text,
        headers,
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_request_block() {
        let parsed = parse_request_block("POST /login HTTP/1.1\nHost: a.com\nX-A: 1");
        assert_eq!(
            parsed,
            ParsedRequestBlock {
                method: "POST".to_string(),
                path: "/login".to_string(),
                protocol_version: "HTTP/1.1".to_string(),
                header_lines: "Host: a.com\nX-A: 1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_request_block_missing_parts() {
        let parsed = parse_request_block("GET");
        assert_eq!(parsed.method, "GET");
        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.protocol_version, "");
        assert_eq!(parsed.header_lines, "");

        let empty = parse_request_block("");
        assert_eq!(empty.method, "");
        assert_eq!(empty.path, "/");
    }

    #[test]
    fn test_parse_header_lines() {
        let map = parse_header_lines(
            "GET / HTTP/1.1\nHost: a.com:8080\n\nnot a header\n  Accept :  */*  ",
        );
        assert_eq!(map, headers(&[("Host", "a.com:8080"), ("Accept", "*/*")]));
    }

    #[test]
    fn test_format_response() {
        let response = RepeaterResponse::from_parts(
            200,
            Some("OK".to_string()),
            Some(headers(&[("Content-Type", "text/plain"), ("X-Id", "7")])),
            Some("hello".to_string()),
        );
        assert_eq!(
            format_response(&response),
            "HTTP/1.1 200 OK\nContent-Type: text/plain\nX-Id: 7\n\nhello"
        );
    }

    #[test]
    fn test_format_response_empty_body_keeps_separator() {
        let response = RepeaterResponse::from_parts(
            204,
            Some("No Content".to_string()),
            Some(headers(&[("Server", "x")])),
            None,
        );
        assert_eq!(
            format_response(&response),
            "HTTP/1.1 204 No Content\nServer: x\n\n"
        );
    }

    #[test]
    fn test_response_text_round_trip() {
        let header_map = headers(&[("B", "2"), ("A", "1"), ("Link", "<http://x>; rel=next")]);
        let response = RepeaterResponse::from_parts(
            404,
            Some("Not Found".to_string()),
            Some(header_map),
            Some("missing\n\nreally".to_string()),
        );

        let parsed = parse_response_block(&format_response(&response)).expect("should parse");
        assert_eq!(parsed.status, 404);
        assert_eq!(parsed.status_text, "Not Found");
        assert_eq!(parsed.headers, response.headers);
        assert_eq!(
            parsed.headers.keys().collect::<Vec<_>>(),
            vec!["B", "A", "Link"]
        );
        assert_eq!(parsed.body, "missing\n\nreally");
    }

    #[test]
    fn test_round_trip_without_headers() {
        let response = RepeaterResponse::from_parts(200, None, None, Some("ok".to_string()));
        let parsed = parse_response_block(&format_response(&response)).expect("should parse");
        assert!(parsed.headers.is_empty());
        assert_eq!(parsed.status_text, "200");
        assert_eq!(parsed.body, "ok");
    }

    #[test]
    fn test_parse_response_rejects_bad_status() {
        let result = parse_response_block("HTTP/1.1 abc\n\n");
        assert!(matches!(result, Err(DomainError::MalformedMessage(_))));
    }
}
