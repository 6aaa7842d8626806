#![cfg(test)]
use std::{io::Cursor, sync::Arc};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use sea_orm::DatabaseConnection;

use configs::MediaConfig;

use crate::{
    content::ContentService,
    media::{Confirmation, JpegTransform, MediaService},
    storage::{MemoryObjectStorage, ObjectStorage, StorageError, StoredObject},
};

/// Fresh migrated in-memory database for the current test.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    models::db::connect_in_memory().await
}

/// Encoded PNG of the given size with a simple gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    buf.into_inner()
}

pub struct Fixture {
    pub db: DatabaseConnection,
    pub storage: Arc<MemoryObjectStorage>,
    pub media: Arc<MediaService>,
    pub content: ContentService,
}

/// Services over an in-memory database and blob store, confirming inline.
pub async fn media_fixture() -> Result<Fixture, anyhow::Error> {
    let storage = Arc::new(MemoryObjectStorage::new());
    fixture_over(storage.clone(), storage).await
}

/// Like [`media_fixture`], but every blob delete fails with an io error.
pub async fn failing_delete_fixture() -> Result<Fixture, anyhow::Error> {
    let storage = Arc::new(MemoryObjectStorage::new());
    let blobs = Arc::new(FailingDeleteStorage { inner: storage.clone() });
    fixture_over(storage, blobs).await
}

async fn fixture_over(storage: Arc<MemoryObjectStorage>, blobs: Arc<dyn ObjectStorage>) -> Result<Fixture, anyhow::Error> {
    let db = get_db().await?;
    let media = Arc::new(MediaService::new(db.clone(), blobs, Arc::new(JpegTransform), MediaConfig::default()));
    let content = ContentService::new(db.clone(), media.clone(), Confirmation::Inline(media.clone()));
    Ok(Fixture { db, storage, media, content })
}

/// Stores normally, refuses every delete.
pub struct FailingDeleteStorage {
    inner: Arc<MemoryObjectStorage>,
}

#[async_trait]
impl ObjectStorage for FailingDeleteStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject, StorageError> {
        self.inner.put(key, bytes, content_type).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(format!("permission denied removing {key}")))
    }
}
