//! Output sink for finished bundles
//! Backed by the `object_store` crate: a local directory or memory

use async_trait::async_trait;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::archive::Bundle;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid bundle name: {0:?}")]
    InvalidName(String),

    #[error("Failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Where a bundle ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBundle {
    pub key: String,
    pub size: usize,
}

/// Receives the bundle of a finished run
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn store(&self, folder: &str, bundle: &Bundle) -> Result<StoredBundle>;
}

/// Output sink wrapping object_store
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    pub location: String,
}

impl StorageClient {
    pub fn new(store: Arc<dyn ObjectStore>, location: impl Into<String>) -> Self {
        Self {
            store,
            location: location.into(),
        }
    }

    /// Bundles kept in memory, for tests and dry runs
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory")
    }

    /// Bundles written below `dir`, which is created when missing
    pub fn local(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let store = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self::new(Arc::new(store), dir.display().to_string()))
    }

    /// Object key for a bundle: `{folder}/{name}`, or the bare name when
    /// the folder is blank
    pub fn key_for(folder: &str, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() || name.contains('/') {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let folder = folder.trim().trim_matches('/');
        if folder.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{}/{}", folder, name))
        }
    }

    pub async fn upload(&self, key: &str, data: bytes::Bytes) -> Result<StoredBundle> {
        let path = StoragePath::from(key);
        let size = data.len();

        self.store.put(&path, data.into()).await?;

        tracing::info!(key, size, location = %self.location, "Bundle stored");

        Ok(StoredBundle {
            key: key.to_string(),
            size,
        })
    }

    pub async fn download(&self, key: &str) -> Result<bytes::Bytes> {
        let path = StoragePath::from(key);
        let bytes = self.store.get(&path).await?.bytes().await?;

        tracing::debug!(key, size = bytes.len(), "Read from storage");

        Ok(bytes)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl OutputSink for StorageClient {
    async fn store(&self, folder: &str, bundle: &Bundle) -> Result<StoredBundle> {
        let key = Self::key_for(folder, &bundle.name)?;
        self.upload(&key, bundle.bytes.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn bundle(name: &str) -> Bundle {
        Bundle {
            name: name.to_string(),
            bytes: Bytes::from_static(b"PK"),
        }
    }

    #[test]
    fn test_key_for() {
        assert_eq!(StorageClient::key_for("Summer", "a.zip").unwrap(), "Summer/a.zip");
        assert_eq!(StorageClient::key_for("  ", "a.zip").unwrap(), "a.zip");
        assert!(matches!(
            StorageClient::key_for("Summer", "x/a.zip"),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let client = StorageClient::in_memory();
        let stored = client.store("Summer", &bundle("Summer 3.zip")).await.unwrap();

        assert_eq!(stored.key, "Summer/Summer 3.zip");
        assert_eq!(stored.size, 2);
        assert!(client.exists(&stored.key).await.unwrap());
        assert!(!client.exists("Summer/other.zip").await.unwrap());
        assert_eq!(client.download(&stored.key).await.unwrap(), Bytes::from_static(b"PK"));
    }

    #[tokio::test]
    async fn test_local_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("out");

        let client = StorageClient::local(&dir).unwrap();
        let stored = client.store("Thread", &bundle("pack.zip")).await.unwrap();

        assert!(dir.join("Thread").join("pack.zip").is_file());
        assert_eq!(stored.key, "Thread/pack.zip");
    }
}
