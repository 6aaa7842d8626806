//! Create `content_entry` table.
//! Every ordered content kind (FAQ, services, menu items, gallery, blocks,
//! settings) shares this table; kind-specific fields live in `data`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContentEntry::Table)
                    .if_not_exists()
                    .col(uuid(ContentEntry::Id).primary_key())
                    .col(string_len(ContentEntry::Kind, 32).not_null())
                    .col(integer(ContentEntry::SortOrder).not_null())
                    .col(uuid_null(ContentEntry::ParentId))
                    .col(uuid_null(ContentEntry::MediaAssetId))
                    .col(string_len_null(ContentEntry::UniqueKey, 256))
                    .col(json(ContentEntry::Data).not_null())
                    .col(timestamp_with_time_zone(ContentEntry::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ContentEntry::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_entry_parent")
                            .from(ContentEntry::Table, ContentEntry::ParentId)
                            .to(ContentEntry::Table, ContentEntry::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    // Assets are released by the service once unreferenced;
                    // the restriction catches a release racing a new reference.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_entry_media_asset")
                            .from(ContentEntry::Table, ContentEntry::MediaAssetId)
                            .to(MediaAsset::Table, MediaAsset::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ContentEntry::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ContentEntry {
    Table,
    Id,
    Kind,
    SortOrder,
    ParentId,
    MediaAssetId,
    UniqueKey,
    Data,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MediaAsset { Table, Id }
