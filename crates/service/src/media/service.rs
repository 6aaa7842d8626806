use std::{sync::Arc, time::Duration};

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait, TransactionTrait};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use configs::MediaConfig;
use models::{
    content_entry,
    media_asset::{self, NewAsset},
};

use super::transform::{ImageTransform, TransformError};
use crate::{errors::ServiceError, metrics, storage::{ObjectStorage, StorageError}};

pub struct MediaService {
    db: DatabaseConnection,
    storage: Arc<dyn ObjectStorage>,
    transform: Arc<dyn ImageTransform>,
    cfg: MediaConfig,
}

impl MediaService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn ObjectStorage>,
        transform: Arc<dyn ImageTransform>,
        cfg: MediaConfig,
    ) -> Self {
        Self { db, storage, transform, cfg }
    }

    pub fn config(&self) -> &MediaConfig { &self.cfg }

    /// Optimize an upload, store the blob and record it as a staging asset.
    #[instrument(skip(self, bytes), fields(size = bytes.len(), %content_type))]
    pub async fn stage(&self, bytes: Vec<u8>, content_type: &str) -> Result<media_asset::Model, ServiceError> {
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(ServiceError::validation(format!("unsupported content type '{content_type}', only images are accepted")));
        }
        if bytes.is_empty() {
            return Err(ServiceError::validation("upload is empty"));
        }
        if bytes.len() > self.cfg.max_upload_bytes {
            return Err(ServiceError::validation(format!("upload exceeds {} bytes", self.cfg.max_upload_bytes)));
        }

        let transform = self.transform.clone();
        let (max_dimension, quality) = (self.cfg.max_dimension, self.cfg.quality);
        let encoded = tokio::task::spawn_blocking(move || transform.resize_and_encode(&bytes, max_dimension, quality))
            .await
            .map_err(|e| ServiceError::Internal(format!("image task failed: {e}")))?
            .map_err(|e| match e {
                TransformError::Decode(_) => ServiceError::Validation(e.to_string()),
                TransformError::Encode(_) => ServiceError::Internal(e.to_string()),
            })?;

        let key = format!("uploads/{}.jpg", Uuid::new_v4());
        let (width, height, size) = (encoded.width as i32, encoded.height as i32, encoded.size() as i64);
        let stored = self.storage.put(&key, encoded.bytes, "image/jpeg").await?;

        let asset = NewAsset {
            url: stored.url,
            storage_key: stored.key,
            content_type: "image/jpeg".into(),
            size,
            width,
            height,
        };
        match media_asset::insert_staging(&self.db, asset).await {
            Ok(row) => {
                metrics::MEDIA_STAGED_TOTAL.inc();
                info!(asset_id = %row.id, key = %row.storage_key, width, height, size, "media staged");
                Ok(row)
            }
            Err(e) => {
                if let Err(de) = self.storage.delete(&key).await {
                    warn!(%key, error = %de, "could not remove blob after failed insert");
                }
                Err(e.into())
            }
        }
    }

    /// Move staging assets to active. Unknown and already active ids are
    /// ignored, so repeating a call is harmless.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn confirm(&self, ids: &[Uuid]) -> Result<u64, ServiceError> {
        let n = media_asset::activate_many(&self.db, ids).await?;
        metrics::MEDIA_CONFIRMED_TOTAL.inc_by(n);
        debug!(confirmed = n, "media confirmed");
        Ok(n)
    }

    /// Delete the asset row and its blob. The caller has checked that no
    /// entry references it; a reference appearing meanwhile makes the row
    /// delete fail with `Conflict` and leaves the blob alone.
    #[instrument(skip(self), fields(%asset_id))]
    pub async fn release(&self, asset_id: Uuid) -> Result<(), ServiceError> {
        let asset = media_asset::Entity::find_by_id(asset_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("media asset {asset_id}")))?;
        let key = asset.storage_key.clone();
        asset.delete(&self.db).await?;
        metrics::MEDIA_RELEASED_TOTAL.inc();

        match self.storage.delete(&key).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => debug!(%key, "blob already gone"),
            Err(e) => {
                warn!(%key, error = %e, "blob delete failed, object left orphaned");
                return Err(e.into());
            }
        }
        info!(%key, "media released");
        Ok(())
    }

    /// Release the asset when no content entry references it.
    /// Returns whether it was released. Once the row is gone the asset counts
    /// as released; a failed blob delete is only logged here.
    pub async fn release_if_unreferenced(&self, asset_id: Uuid) -> Result<bool, ServiceError> {
        let refs = content_entry::count_media_refs(&self.db, asset_id).await?;
        if refs > 0 {
            debug!(%asset_id, refs, "media still referenced");
            return Ok(false);
        }
        match self.release(asset_id).await {
            Ok(()) => Ok(true),
            // `release` only reports storage errors after the row delete.
            Err(ServiceError::Storage(e)) => {
                warn!(%asset_id, error = %e, "asset released with its blob left behind");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Admin-initiated delete: refuses while anything points at the asset.
    pub async fn delete_asset(&self, asset_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let exists = media_asset::Entity::find_by_id(asset_id).one(&txn).await?.is_some();
        let refs = content_entry::count_media_refs(&txn, asset_id).await?;
        txn.commit().await?;
        if !exists {
            return Err(ServiceError::not_found(format!("media asset {asset_id}")));
        }
        if refs > 0 {
            return Err(ServiceError::Conflict(format!("media asset {asset_id} is used by {refs} entries")));
        }
        self.release(asset_id).await
    }

    /// Release staging assets older than `older_than` that nothing references.
    /// Failures on single assets are logged and skipped.
    #[instrument(skip(self))]
    pub async fn sweep_staging(&self, older_than: Duration) -> Result<usize, ServiceError> {
        let age = chrono::Duration::from_std(older_than).map_err(|e| ServiceError::Internal(e.to_string()))?;
        let stale = media_asset::find_stale_staging(&self.db, Utc::now() - age).await?;
        let mut released = 0;
        for asset in stale {
            match self.release_if_unreferenced(asset.id).await {
                Ok(true) => released += 1,
                Ok(false) => {}
                Err(e) => warn!(asset_id = %asset.id, error = %e, "sweep could not release asset"),
            }
        }
        if released > 0 {
            info!(released, "staging sweep done");
        }
        Ok(released)
    }

    pub async fn list(&self) -> Result<Vec<media_asset::Model>, ServiceError> {
        Ok(media_asset::list_newest_first(&self.db).await?)
    }

    pub async fn get(&self, asset_id: Uuid) -> Result<media_asset::Model, ServiceError> {
        media_asset::Entity::find_by_id(asset_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("media asset {asset_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{media_fixture, png_bytes};
    use models::media_asset::MediaStatus;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn stage_stores_optimized_jpeg() -> anyhow::Result<()> {
        let fx = media_fixture().await?;
        let asset = fx.media.stage(png_bytes(2400, 1200), "image/png").await?;
        assert_eq!(asset.status, MediaStatus::Staging);
        assert_eq!((asset.width, asset.height), (1920, 960));
        assert_eq!(asset.content_type, "image/jpeg");
        assert!(asset.storage_key.starts_with("uploads/") && asset.storage_key.ends_with(".jpg"));
        assert_eq!(asset.url, format!("/media/{}", asset.storage_key));
        assert!(fx.storage.contains(&asset.storage_key));
        Ok(())
    }

    #[tokio::test]
    async fn stage_rejects_non_images_and_oversized() -> anyhow::Result<()> {
        let fx = media_fixture().await?;
        let err = fx.media.stage(b"%PDF".to_vec(), "application/pdf").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let too_big = vec![0u8; fx.media.config().max_upload_bytes + 1];
        assert!(matches!(fx.media.stage(too_big, "image/png").await, Err(ServiceError::Validation(_))));
        assert!(matches!(fx.media.stage(b"junk".to_vec(), "image/png").await, Err(ServiceError::Validation(_))));
        assert!(fx.storage.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn confirm_twice_is_idempotent() -> anyhow::Result<()> {
        let fx = media_fixture().await?;
        let asset = fx.media.stage(png_bytes(10, 10), "image/png").await?;
        assert_eq!(fx.media.confirm(&[asset.id]).await?, 1);
        assert_eq!(fx.media.confirm(&[asset.id]).await?, 0);
        assert_eq!(fx.media.get(asset.id).await?.status, MediaStatus::Active);
        assert_eq!(fx.media.confirm(&[Uuid::new_v4()]).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn release_tolerates_missing_blob() -> anyhow::Result<()> {
        let fx = media_fixture().await?;
        let asset = fx.media.stage(png_bytes(10, 10), "image/png").await?;
        fx.storage.delete(&asset.storage_key).await?;
        fx.media.release(asset.id).await?;
        assert!(matches!(fx.media.get(asset.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(fx.media.release(asset.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn sweep_releases_only_old_staging() -> anyhow::Result<()> {
        let fx = media_fixture().await?;
        let old = fx.media.stage(png_bytes(10, 10), "image/png").await?;
        let old_active = fx.media.stage(png_bytes(10, 10), "image/png").await?;
        let fresh = fx.media.stage(png_bytes(10, 10), "image/png").await?;
        fx.media.confirm(&[old_active.id]).await?;
        for id in [old.id, old_active.id] {
            let mut am: media_asset::ActiveModel = fx.media.get(id).await?.into();
            am.created_at = Set((Utc::now() - chrono::Duration::days(2)).into());
            am.update(&fx.db).await?;
        }

        let released = fx.media.sweep_staging(Duration::from_secs(24 * 3600)).await?;
        assert_eq!(released, 1);
        assert!(!fx.storage.contains(&old.storage_key));
        assert!(fx.storage.contains(&old_active.storage_key));
        assert!(fx.storage.contains(&fresh.storage_key));
        Ok(())
    }
}
