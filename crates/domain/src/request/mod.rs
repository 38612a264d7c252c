//! Repeater request domain types

mod config;
mod payload;
mod seed;
mod spec;

pub use config::{Protocol, RequestConfig, build_target_url};
pub use payload::{ReplayPayload, format_request_for_api};
pub use seed::TabSeed;
pub use spec::{DEFAULT_USER_AGENT, RepeaterRequest};
