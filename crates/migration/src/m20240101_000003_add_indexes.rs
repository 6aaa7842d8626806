use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ContentEntry: sibling scope lookups (list, max order)
        manager
            .create_index(
                Index::create()
                    .name("idx_content_entry_scope")
                    .table(ContentEntry::Table)
                    .col(ContentEntry::Kind)
                    .col(ContentEntry::ParentId)
                    .col(ContentEntry::SortOrder)
                    .to_owned(),
            )
            .await?;

        // ContentEntry: slug / settings key / hero page, unique per kind
        manager
            .create_index(
                Index::create()
                    .name("uniq_content_entry_kind_key")
                    .table(ContentEntry::Table)
                    .col(ContentEntry::Kind)
                    .col(ContentEntry::UniqueKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ContentEntry: media reference counting
        manager
            .create_index(
                Index::create()
                    .name("idx_content_entry_media")
                    .table(ContentEntry::Table)
                    .col(ContentEntry::MediaAssetId)
                    .to_owned(),
            )
            .await?;

        // MediaAsset: staging sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_media_asset_status_created")
                    .table(MediaAsset::Table)
                    .col(MediaAsset::Status)
                    .col(MediaAsset::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_media_asset_status_created").table(MediaAsset::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_content_entry_media").table(ContentEntry::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_content_entry_kind_key").table(ContentEntry::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_content_entry_scope").table(ContentEntry::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ContentEntry {
    Table,
    Kind,
    ParentId,
    SortOrder,
    UniqueKey,
    MediaAssetId,
}

#[derive(DeriveIden)]
enum MediaAsset {
    Table,
    Status,
    CreatedAt,
}
