//! JSON encoding for files written by Snare.
//!
//! State and export files use 2-space indentation with a trailing newline.

mod json;

pub use json::{SerializationError, from_json, to_json_stable};
