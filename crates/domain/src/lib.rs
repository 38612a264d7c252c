//! Snare Domain - Core types for the proxy control panel
//!
//! This crate defines the repeater tab model, captured traffic records,
//! settings, debug log entries and session artifacts, plus the pure
//! conversions between raw HTTP text and structured values.
//! All types here are pure Rust with no I/O dependencies.

pub mod codec;
pub mod error;
pub mod id;
pub mod log_entry;
pub mod logs;
pub mod proxy_log;
pub mod request;
pub mod response;
pub mod session;
pub mod settings;
pub mod tab;

pub use error::{DomainError, DomainResult};
pub use id::{generate_id, short_id};
pub use log_entry::{EnhancedLogEntry, LogDetails, LogEntry, LogSource, LogType, format_timestamp};
pub use logs::{FilterOptions, LogSortField, ProxySortColumn, SortDirection};
pub use proxy_log::{CapturedRequest, CapturedResponse, ProxyLog, ProxyLogStatus};
pub use request::{
    Protocol, RepeaterRequest, ReplayPayload, RequestConfig, TabSeed, build_target_url,
    format_request_for_api,
};
pub use response::{HeaderMap, RepeaterResponse};
pub use session::{SessionArtifact, Validation, validate_session};
pub use settings::{ProxySettings, SettingsPatch};
pub use tab::{Tab, TabImport};
