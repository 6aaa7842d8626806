use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::Expr, Set, ConnectionTrait, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    /// Uploaded, not yet attached to a committed entry.
    #[sea_orm(string_value = "staging")]
    Staging,
    #[sea_orm(string_value = "active")]
    Active,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media_asset")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub url: String,
    #[sea_orm(unique)]
    pub storage_key: String,
    pub status: MediaStatus,
    pub content_type: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Metadata of an optimized upload, as produced by the image pipeline.
#[derive(Clone, Debug)]
pub struct NewAsset {
    pub url: String,
    pub storage_key: String,
    pub content_type: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
}

pub async fn insert_staging<C: ConnectionTrait>(db: &C, asset: NewAsset) -> Result<Model, ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        url: Set(asset.url),
        storage_key: Set(asset.storage_key),
        status: Set(MediaStatus::Staging),
        content_type: Set(asset.content_type),
        size: Set(asset.size),
        width: Set(asset.width),
        height: Set(asset.height),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Flip the given staging assets to active; returns how many rows changed.
/// Already-active and unknown ids are left alone.
pub async fn activate_many<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> Result<u64, ModelError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let now: DateTimeWithTimeZone = Utc::now().into();
    let res = Entity::update_many()
        .col_expr(Column::Status, Expr::value(MediaStatus::Active))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.is_in(ids.iter().copied()))
        .filter(Column::Status.eq(MediaStatus::Staging))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

/// Staging assets created strictly before `cutoff`.
pub async fn find_stale_staging<C: ConnectionTrait>(db: &C, cutoff: DateTime<Utc>) -> Result<Vec<Model>, ModelError> {
    let cutoff: DateTimeWithTimeZone = cutoff.into();
    Ok(Entity::find()
        .filter(Column::Status.eq(MediaStatus::Staging))
        .filter(Column::CreatedAt.lt(cutoff))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn list_newest_first<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().order_by_desc(Column::CreatedAt).all(db).await?)
}

