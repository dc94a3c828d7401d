//! File-backed key-value store
//!
//! One JSON document per key under the data directory. Writes replace the
//! whole file; reads of a missing file report absence, not failure.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use super::{KeyLocks, KeyValueStore, StorageError};

/// Durable store writing `<key>.json` files under a base directory
pub struct FileStore {
    base_dir: PathBuf,
    locks: KeyLocks,
}

impl FileStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await?;
        Ok(Self {
            base_dir,
            locks: KeyLocks::new(),
        })
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.document_path(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.document_path(key);
        tokio::fs::write(&path, value).await?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.document_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(key).await
    }
}
