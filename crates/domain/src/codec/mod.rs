//! Conversions between raw HTTP message text and structured values.
//!
//! The editor works on raw text: a request line followed by header lines,
//! with the body kept separately. These functions are pure and never touch
//! the network.

mod curl;
mod message;
mod proxy;

pub use curl::{build_curl_command, curl_for_log};
pub use message::{
    ParsedRequestBlock, ParsedResponse, format_response, parse_header_lines, parse_request_block,
    parse_response_block,
};
pub use proxy::{
    extract_domain, format_proxy_request, format_proxy_response, repeater_seed_from_log,
};
