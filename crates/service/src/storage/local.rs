use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{check_key, public_url, ObjectStorage, StorageError, StoredObject};

/// Stores blobs as files under a root directory that is served statically
/// under `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self { root: root.into(), public_base_url: public_base_url.into() }
    }

    pub fn from_config(cfg: &configs::MediaConfig) -> Self {
        Self::new(&cfg.storage_dir, cfg.public_base_url.clone())
    }

    fn path_of(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject, StorageError> {
        let path = self.path_of(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let size = bytes.len();
        fs::write(&path, bytes).await.map_err(|e| StorageError::Io(e.to_string()))?;
        debug!(%key, size, %content_type, "object stored");
        Ok(StoredObject { key: key.to_string(), url: public_url(&self.public_base_url, key) })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_of(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}
