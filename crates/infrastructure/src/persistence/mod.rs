//! Local persistence adapters.
//!
//! UI state lives in `{state_dir}/{key}.json`; exports land in the export
//! directory.

mod artifacts;
mod key_value;

pub use artifacts::DirectoryArtifactStore;
pub use key_value::{FileKeyValueStore, MemoryKeyValueStore};

use snare_application::ports::StorageError;

/// Rejects names that would escape their directory.
fn plain_file_name(name: &str) -> Result<&str, StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        Err(StorageError::InvalidLocation(name.to_string()))
    } else {
        Ok(name)
    }
}
