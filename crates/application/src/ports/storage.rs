//! Storage ports

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The key or path is not usable.
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

/// Small durable key/value store for UI state.
///
/// Values are JSON text. Reads and writes are synchronous; they happen once
/// at startup and after each tab mutation.
pub trait KeyValueStore: Send + Sync {
    /// Stores a value, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Reads a value; `Ok(None)` if absent.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Removes a value; absent keys are not an error.
    ///
    /// # Errors
    /// Returns an error if the value cannot be removed.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Destination for exported files and source of imported ones.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes an artifact under a file name and returns where it landed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    async fn save(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, StorageError>;

    /// Reads an artifact as UTF-8 text.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    async fn read(&self, path: &Path) -> Result<String, StorageError>;
}
