use async_trait::async_trait;
use dashmap::DashMap;

use super::{check_key, public_url, ObjectStorage, StorageError, StoredObject};

/// In-process blob store, used by tests and local demos.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self { Self::default() }

    pub fn contains(&self, key: &str) -> bool { self.objects.contains_key(key) }

    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<StoredObject, StorageError> {
        check_key(key)?;
        self.objects.insert(key.to_string(), bytes);
        Ok(StoredObject { key: key.to_string(), url: public_url("/media", key) })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.objects.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}
