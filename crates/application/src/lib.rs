//! Snare Application - Services and ports
//!
//! This crate defines the application layer with:
//! - Port traits for the backend API, storage, clock and status notices
//! - Stateful services: repeater tabs, log polling, session transfer,
//!   settings and the unified debug log
//! - Application-level error handling

pub mod cancellation;
pub mod error;
pub mod events;
pub mod logs;
pub mod ports;
pub mod repeater;
pub mod session;
pub mod settings;
pub mod status;

#[cfg(test)]
mod test_support;

pub use cancellation::{CancellationReceiver, CancellationToken};
pub use error::{ApplicationError, ApplicationResult};
pub use events::{EventBus, LogFeed, LogView, Subscription};
pub use logs::{FetchOutcome, LogSyncController};
pub use ports::{
    ApiError, ApiResult, ArtifactStore, Clock, KeyValueStore, LogApi, RepeaterApi, ReplayReply,
    SessionApi, SettingsApi, StatusReporter, StorageError, ViewContext,
};
pub use repeater::{ConfigPatch, RequestDispatcher, RequestEdit, TabStore, TabTransfer};
pub use session::SessionTransfer;
pub use settings::SettingsService;
pub use status::StatusBoard;
