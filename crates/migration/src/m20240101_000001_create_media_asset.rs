//! Create `media_asset` table.
//! One row per optimized upload; the blob itself lives in object storage.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MediaAsset::Table)
                    .if_not_exists()
                    .col(uuid(MediaAsset::Id).primary_key())
                    .col(string_len(MediaAsset::Url, 1024).not_null())
                    .col(string_len(MediaAsset::StorageKey, 512).not_null().unique_key())
                    .col(string_len(MediaAsset::Status, 16).not_null())
                    .col(string_len(MediaAsset::ContentType, 64).not_null())
                    .col(big_integer(MediaAsset::Size).not_null())
                    .col(integer(MediaAsset::Width).not_null())
                    .col(integer(MediaAsset::Height).not_null())
                    .col(timestamp_with_time_zone(MediaAsset::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(MediaAsset::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MediaAsset::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MediaAsset {
    Table,
    Id,
    Url,
    StorageKey,
    Status,
    ContentType,
    Size,
    Width,
    Height,
    CreatedAt,
    UpdatedAt,
}
