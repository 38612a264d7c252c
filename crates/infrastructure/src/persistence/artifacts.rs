//! Export directory adapter.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snare_application::ports::{ArtifactStore, StorageError};
use tokio::fs;
use tracing::info;

use super::plain_file_name;

/// Writes exports into one directory and reads imports from disk.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactStore {
    dir: PathBuf,
}

impl DirectoryArtifactStore {
    /// Creates a store writing into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Export directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Relative paths that do not exist as given are looked up in the
    /// export directory.
    async fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || fs::try_exists(path).await.unwrap_or(false) {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }
}

#[async_trait]
impl ArtifactStore for DirectoryArtifactStore {
    async fn save(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, StorageError> {
        let name = plain_file_name(file_name)?;
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        fs::write(&path, contents).await?;
        info!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(path)
    }

    async fn read(&self, path: &Path) -> Result<String, StorageError> {
        let resolved = self.resolve(path).await;
        Ok(fs::read_to_string(&resolved).await?)
    }
}
