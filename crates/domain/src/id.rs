//! ID generation utilities.

use uuid::Uuid;

/// Number of leading id characters used in tab labels.
pub const SHORT_ID_LEN: usize = 8;

/// Generates a new UUID v4 as a string.
///
/// This is the standard ID format for repeater tabs.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the first eight characters of an id, or the whole id if shorter.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(idx, _)| &id[..idx])
}
