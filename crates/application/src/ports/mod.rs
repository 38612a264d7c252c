//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod api;
mod clock;
mod status;
mod storage;

pub use api::{ApiError, ApiResult, LogApi, RepeaterApi, ReplayReply, SessionApi, SettingsApi};
pub use clock::Clock;
pub use status::{StatusReporter, ViewContext};
pub use storage::{ArtifactStore, KeyValueStore, StorageError};
