use sea_orm::{
    entity::prelude::*, sea_query::Expr, ConnectionTrait, FromQueryResult, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, kind::EntityKind, media_asset};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_entry")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: EntityKind,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub parent_id: Option<Uuid>,
    pub media_asset_id: Option<Uuid>,
    #[serde(skip_serializing, default)]
    pub unique_key: Option<String>,
    pub data: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Parent, MediaAsset }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Parent => Entity::belongs_to(Entity).from(Column::ParentId).to(Column::Id).into(),
            Relation::MediaAsset => Entity::belongs_to(media_asset::Entity)
                .from(Column::MediaAssetId)
                .to(media_asset::Column::Id)
                .into(),
        }
    }
}

impl Related<media_asset::Entity> for Entity {
    fn to() -> RelationDef { Relation::MediaAsset.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Condition selecting the sibling scope `(kind, parent_id)`.
pub fn scope_filter(kind: EntityKind, parent_id: Option<Uuid>) -> sea_orm::Condition {
    let cond = sea_orm::Condition::all().add(Column::Kind.eq(kind));
    match parent_id {
        Some(p) => cond.add(Column::ParentId.eq(p)),
        None => cond.add(Column::ParentId.is_null()),
    }
}

pub async fn find_in_kind<C: ConnectionTrait>(db: &C, kind: EntityKind, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id)
        .filter(Column::Kind.eq(kind))
        .one(db)
        .await?)
}

#[derive(Debug, FromQueryResult)]
struct MaxOrder {
    max_order: Option<i32>,
}

/// Highest `sort_order` among the siblings of `(kind, parent_id)`.
pub async fn max_order_in_scope<C: ConnectionTrait>(db: &C, kind: EntityKind, parent_id: Option<Uuid>) -> Result<Option<i32>, ModelError> {
    let row = Entity::find()
        .select_only()
        .column_as(Expr::col(Column::SortOrder).max(), "max_order")
        .filter(scope_filter(kind, parent_id))
        .into_model::<MaxOrder>()
        .one(db)
        .await?;
    Ok(row.and_then(|r| r.max_order))
}

/// Number of entries, of any kind, referencing the asset.
pub async fn count_media_refs<C: ConnectionTrait>(db: &C, asset_id: Uuid) -> Result<u64, ModelError> {
    Ok(Entity::find()
        .filter(Column::MediaAssetId.eq(asset_id))
        .count(db)
        .await?)
}

pub async fn children_of<C: ConnectionTrait>(db: &C, parent_ids: &[Uuid]) -> Result<Vec<Model>, ModelError> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Entity::find()
        .filter(Column::ParentId.is_in(parent_ids.iter().copied()))
        .order_by_asc(Column::SortOrder)
        .all(db)
        .await?)
}
