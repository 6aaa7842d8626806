//! Blob storage behind uploaded media.
//!
//! The service layer only needs `put` and `delete` by key; where and how the
//! bytes live is up to the implementation.

use async_trait::async_trait;
use thiserror::Error;

pub mod local;
pub mod memory;

pub use local::LocalObjectStorage;
pub use memory::MemoryObjectStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage io error: {0}")]
    Io(String),
}

/// Location of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Join a public prefix and a key without doubling the separator.
pub(crate) fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

/// Keys are relative, slash-separated and never climb out of the root.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(StorageError::Io(format!("invalid object key '{key}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_once() {
        assert_eq!(public_url("/media/", "uploads/a.jpg"), "/media/uploads/a.jpg");
        assert_eq!(public_url("https://cdn.example.com", "/uploads/a.jpg"), "https://cdn.example.com/uploads/a.jpg");
    }

    #[test]
    fn keys_must_stay_inside_root() {
        assert!(check_key("uploads/a.jpg").is_ok());
        for bad in ["", "/etc/passwd", "../a.jpg", "uploads//a.jpg", "uploads/./a.jpg"] {
            assert!(check_key(bad).is_err(), "{bad}");
        }
    }
}
