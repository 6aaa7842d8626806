use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{
    content_entry,
    kind::EntityKind,
    media_asset,
    payload::{self, EntryInput, EntryPatch, ValidatedFields},
};

use super::{
    query::{DeleteOutcome, EntryPage, ListQuery, ReorderItem, SortDirection},
    tree::{build_forest, ensure_acyclic, TreeNode},
};
use crate::{errors::ServiceError, media::{Confirmation, MediaService}, metrics};

/// CRUD and reorder over every content kind.
///
/// All checks that read other rows (parent, media, unique key, cycles) run in
/// the same transaction as the write. Referenced media is confirmed after the
/// commit; media that lost its last reference is released after the commit.
pub struct ContentService {
    db: DatabaseConnection,
    media: Arc<MediaService>,
    confirmation: Confirmation,
}

impl ContentService {
    pub fn new(db: DatabaseConnection, media: Arc<MediaService>, confirmation: Confirmation) -> Self {
        Self { db, media, confirmation }
    }

    #[instrument(skip(self, input), fields(%kind))]
    pub async fn create(&self, kind: EntityKind, input: EntryInput) -> Result<content_entry::Model, ServiceError> {
        payload::validate_placement(kind, input.parent_id, input.media_asset_id)?;
        let fields = payload::validate(kind, &input.fields)?;

        let txn = self.db.begin().await?;
        let res = self.insert_in(&txn, kind, &input, fields).await;
        let row = finish(txn, res).await?;

        if let Some(asset_id) = row.media_asset_id {
            self.confirmation.submit(vec![asset_id]).await;
        }
        metrics::record_mutation(kind, "create");
        info!(id = %row.id, order = row.sort_order, "entry created");
        Ok(row)
    }

    async fn insert_in(
        &self,
        txn: &DatabaseTransaction,
        kind: EntityKind,
        input: &EntryInput,
        fields: ValidatedFields,
    ) -> Result<content_entry::Model, ServiceError> {
        if let Some(parent_id) = input.parent_id {
            check_parent(txn, kind, parent_id).await?;
            if kind.is_tree() {
                // A fresh id cannot be among the ancestors; this only bounds depth.
                ensure_acyclic(txn, Uuid::new_v4(), parent_id).await?;
            }
        }
        if let Some(asset_id) = input.media_asset_id {
            check_media(txn, asset_id).await?;
        }
        check_unique(txn, kind, fields.unique_key.as_deref(), None).await?;

        let order = match input.order {
            Some(o) => o,
            None => next_order(txn, kind, input.parent_id).await?,
        };
        let now = Utc::now().into();
        let am = content_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(kind),
            sort_order: Set(order),
            parent_id: Set(input.parent_id),
            media_asset_id: Set(input.media_asset_id),
            unique_key: Set(fields.unique_key),
            data: Set(fields.data),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(txn).await?)
    }

    /// Partial update: absent keys keep their stored value, the merged record
    /// goes through validation again.
    #[instrument(skip(self, patch), fields(%kind, %id))]
    pub async fn update(&self, kind: EntityKind, id: Uuid, patch: EntryPatch) -> Result<content_entry::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let res = self.update_in(&txn, kind, id, &patch).await;
        let (row, previous_media) = finish(txn, res).await?;

        if row.media_asset_id != previous_media {
            if let Some(new_id) = row.media_asset_id {
                self.confirmation.submit(vec![new_id]).await;
            }
            if let Some(old_id) = previous_media {
                self.release_quietly(old_id).await;
            }
        }
        metrics::record_mutation(kind, "update");
        info!(order = row.sort_order, "entry updated");
        Ok(row)
    }

    async fn update_in(
        &self,
        txn: &DatabaseTransaction,
        kind: EntityKind,
        id: Uuid,
        patch: &EntryPatch,
    ) -> Result<(content_entry::Model, Option<Uuid>), ServiceError> {
        let existing = find_entry(txn, kind, id).await?;
        let parent_id = patch.parent_id.unwrap_or(existing.parent_id);
        let media_asset_id = patch.media_asset_id.unwrap_or(existing.media_asset_id);
        payload::validate_placement(kind, parent_id, media_asset_id)?;

        let merged = payload::merge_fields(&existing.data, &patch.fields);
        let fields = payload::validate(kind, &merged)?;

        let parent_changed = parent_id != existing.parent_id;
        if parent_changed {
            if let Some(p) = parent_id {
                check_parent(txn, kind, p).await?;
                if kind.is_tree() {
                    ensure_acyclic(txn, id, p).await?;
                }
            }
        }
        if media_asset_id != existing.media_asset_id {
            if let Some(m) = media_asset_id {
                check_media(txn, m).await?;
            }
        }
        check_unique(txn, kind, fields.unique_key.as_deref(), Some(id)).await?;

        let order = match patch.order {
            Some(o) => o,
            None if parent_changed => next_order(txn, kind, parent_id).await?,
            None => existing.sort_order,
        };

        let previous_media = existing.media_asset_id;
        let mut am: content_entry::ActiveModel = existing.into();
        am.sort_order = Set(order);
        am.parent_id = Set(parent_id);
        am.media_asset_id = Set(media_asset_id);
        am.unique_key = Set(fields.unique_key);
        am.data = Set(fields.data);
        am.updated_at = Set(Utc::now().into());
        Ok((am.update(txn).await?, previous_media))
    }

    /// Delete an entry together with its descendants, then release media
    /// nothing references anymore. Blob failures at that point are logged.
    #[instrument(skip(self), fields(%kind, %id))]
    pub async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let txn = self.db.begin().await?;
        let res = delete_subtree(&txn, kind, id).await;
        let (deleted, media_ids) = finish(txn, res).await?;

        let mut released_media = 0;
        for asset_id in media_ids {
            if self.release_quietly(asset_id).await {
                released_media += 1;
            }
        }
        metrics::record_mutation(kind, "delete");
        info!(deleted, released_media, "entry deleted");
        Ok(DeleteOutcome { deleted, released_media })
    }

    pub async fn get(&self, kind: EntityKind, id: Uuid) -> Result<content_entry::Model, ServiceError> {
        find_entry(&self.db, kind, id).await
    }

    pub async fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<EntryPage, ServiceError> {
        let mut select = content_entry::Entity::find().filter(content_entry::Column::Kind.eq(kind));
        if let Some(parent_id) = query.parent_id {
            select = select.filter(content_entry::Column::ParentId.eq(parent_id));
        } else if query.roots {
            select = select.filter(content_entry::Column::ParentId.is_null());
        }
        let order = match query.sort {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        let select = select
            .order_by(content_entry::Column::SortOrder, order.clone())
            .order_by(content_entry::Column::CreatedAt, order)
            .order_by_asc(content_entry::Column::Id);

        let pagination = query.pagination();
        let (page_idx, per_page) = pagination.normalize();
        let paginator = select.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_idx).await?;
        Ok(EntryPage { items, total, page: page_idx as u32 + 1, per_page: per_page as u32 })
    }

    /// All entries of a tree kind assembled into a forest.
    pub async fn tree(&self, kind: EntityKind) -> Result<Vec<TreeNode>, ServiceError> {
        if !kind.is_tree() {
            return Err(ServiceError::validation(format!("{kind} entries do not form a tree")));
        }
        let rows = content_entry::Entity::find()
            .filter(content_entry::Column::Kind.eq(kind))
            .all(&self.db)
            .await?;
        Ok(build_forest(rows))
    }

    pub async fn menu_tree(&self) -> Result<Vec<TreeNode>, ServiceError> {
        self.tree(EntityKind::MenuItem).await
    }

    /// Site settings as `key -> value`.
    pub async fn settings_map(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        let rows = content_entry::Entity::find()
            .filter(content_entry::Column::Kind.eq(EntityKind::SiteSetting))
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let key = r.data.get("key")?.as_str()?.to_string();
                let value = r.data.get("value")?.as_str()?.to_string();
                Some((key, value))
            })
            .collect())
    }

    /// Apply a batch of order/parent changes atomically. Orders are stored
    /// as given; on any failure nothing is written.
    #[instrument(skip(self, items), fields(%kind, count = items.len()))]
    pub async fn reorder(&self, kind: EntityKind, items: Vec<ReorderItem>) -> Result<Vec<content_entry::Model>, ServiceError> {
        let batch = parse_batch(&items)?;

        let txn = self.db.begin().await?;
        let res = apply_reorder(&txn, kind, &batch).await;
        let rows = finish(txn, res).await?;

        metrics::record_mutation(kind, "reorder");
        info!("reorder applied");
        Ok(rows)
    }

    /// Release an asset if unreferenced, logging instead of failing.
    async fn release_quietly(&self, asset_id: Uuid) -> bool {
        match self.media.release_if_unreferenced(asset_id).await {
            Ok(released) => released,
            Err(e) => {
                warn!(%asset_id, error = %e, "could not release media after content change");
                false
            }
        }
    }
}

/// Commit on success, roll back on failure.
async fn finish<T>(txn: DatabaseTransaction, res: Result<T, ServiceError>) -> Result<T, ServiceError> {
    match res {
        Ok(v) => {
            txn.commit().await?;
            Ok(v)
        }
        Err(e) => {
            if let Err(rb) = txn.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e)
        }
    }
}

async fn find_entry<C: ConnectionTrait>(conn: &C, kind: EntityKind, id: Uuid) -> Result<content_entry::Model, ServiceError> {
    content_entry::find_in_kind(conn, kind, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("{kind} entry {id}")))
}

async fn check_parent<C: ConnectionTrait>(conn: &C, kind: EntityKind, parent_id: Uuid) -> Result<(), ServiceError> {
    let Some(parent_kind) = kind.parent_kind() else {
        return Err(ServiceError::validation(format!("{kind} entries cannot have a parentId")));
    };
    if content_entry::find_in_kind(conn, parent_kind, parent_id).await?.is_none() {
        return Err(ServiceError::validation(format!("parentId {parent_id} does not reference an existing {parent_kind} entry")));
    }
    Ok(())
}

async fn check_media<C: ConnectionTrait>(conn: &C, asset_id: Uuid) -> Result<(), ServiceError> {
    if media_asset::Entity::find_by_id(asset_id).one(conn).await?.is_none() {
        return Err(ServiceError::validation(format!("mediaAssetId {asset_id} does not reference an uploaded asset")));
    }
    Ok(())
}

async fn check_unique<C: ConnectionTrait>(conn: &C, kind: EntityKind, key: Option<&str>, exclude: Option<Uuid>) -> Result<(), ServiceError> {
    let Some(key) = key else { return Ok(()) };
    let mut q = content_entry::Entity::find()
        .filter(content_entry::Column::Kind.eq(kind))
        .filter(content_entry::Column::UniqueKey.eq(key));
    if let Some(id) = exclude {
        q = q.filter(content_entry::Column::Id.ne(id));
    }
    if q.one(conn).await?.is_some() {
        return Err(ServiceError::Conflict(format!("{kind} entry '{key}' already exists")));
    }
    Ok(())
}

async fn next_order<C: ConnectionTrait>(conn: &C, kind: EntityKind, parent_id: Option<Uuid>) -> Result<i32, ServiceError> {
    Ok(match content_entry::max_order_in_scope(conn, kind, parent_id).await? {
        Some(max) => max.saturating_add(1),
        None => 0,
    })
}

async fn delete_subtree(txn: &DatabaseTransaction, kind: EntityKind, id: Uuid) -> Result<(usize, Vec<Uuid>), ServiceError> {
    let root = find_entry(txn, kind, id).await?;
    let mut seen: HashSet<Uuid> = HashSet::from([root.id]);
    let mut media: Vec<Uuid> = root.media_asset_id.into_iter().collect();
    let mut frontier = vec![root.id];
    while !frontier.is_empty() {
        let children = content_entry::children_of(txn, &frontier).await?;
        frontier = Vec::new();
        for child in children {
            if seen.insert(child.id) {
                frontier.push(child.id);
                media.extend(child.media_asset_id);
            }
        }
    }
    // Rows removed by the parent FK cascade are not counted by every
    // backend, so report the collected subtree size.
    let ids: Vec<Uuid> = seen.into_iter().collect();
    content_entry::Entity::delete_many()
        .filter(content_entry::Column::Id.is_in(ids.iter().copied()))
        .exec(txn)
        .await?;

    let mut unique_media = HashSet::new();
    media.retain(|m| unique_media.insert(*m));
    Ok((ids.len(), media))
}

struct ParsedItem {
    id: Uuid,
    order: i32,
    parent: Option<Option<Uuid>>,
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::validation(format!("{field} '{raw}' is not a valid id")))
}

fn parse_batch(items: &[ReorderItem]) -> Result<Vec<ParsedItem>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::validation("reorder batch is empty"));
    }
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let id = parse_id(&item.id, "id")?;
        if !seen.insert(id) {
            return Err(ServiceError::validation(format!("id {id} appears more than once in the batch")));
        }
        let parent = match &item.parent_id {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_id(raw, "parentId")?)),
        };
        out.push(ParsedItem { id, order: item.order, parent });
    }
    Ok(out)
}

async fn apply_reorder(txn: &DatabaseTransaction, kind: EntityKind, batch: &[ParsedItem]) -> Result<Vec<content_entry::Model>, ServiceError> {
    let now = Utc::now();
    let mut moved = Vec::new();
    let mut rows = Vec::with_capacity(batch.len());
    for item in batch {
        let existing = find_entry(txn, kind, item.id).await?;
        let parent_id = item.parent.unwrap_or(existing.parent_id);
        if parent_id != existing.parent_id {
            payload::validate_placement(kind, parent_id, existing.media_asset_id)?;
            if let Some(p) = parent_id {
                check_parent(txn, kind, p).await?;
                moved.push((item.id, p));
            }
        }
        let mut am: content_entry::ActiveModel = existing.into();
        am.sort_order = Set(item.order);
        am.parent_id = Set(parent_id);
        am.updated_at = Set(now.into());
        rows.push(am.update(txn).await?);
    }
    if kind.is_tree() {
        for (id, parent) in moved {
            ensure_acyclic(txn, id, parent).await?;
        }
    }
    rows.sort_by(|a, b| a.parent_id.cmp(&b.parent_id).then(a.sort_order.cmp(&b.sort_order)));
    Ok(rows)
}
