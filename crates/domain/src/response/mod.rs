//! Replay response types.

mod spec;

pub use spec::{HeaderMap, RepeaterResponse};
