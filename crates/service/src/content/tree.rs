use std::collections::{HashMap, HashSet};

use sea_orm::{ConnectionTrait, EntityTrait, QuerySelect};
use serde::Serialize;
use uuid::Uuid;

use models::content_entry;

use crate::errors::ServiceError;

/// Deepest parent chain accepted in a tree kind.
pub const MAX_TREE_DEPTH: usize = 32;

/// Fails when making `parent` the parent of `id` would put `id` among its own
/// ancestors. Reads through `conn`, so pending changes of an open transaction
/// are taken into account.
pub async fn ensure_acyclic<C: ConnectionTrait>(conn: &C, id: Uuid, parent: Uuid) -> Result<(), ServiceError> {
    let mut seen = HashSet::new();
    let mut cursor = Some(parent);
    while let Some(current) = cursor {
        if current == id {
            return Err(ServiceError::validation(format!("moving {id} under {parent} would create a cycle")));
        }
        if !seen.insert(current) || seen.len() > MAX_TREE_DEPTH {
            return Err(ServiceError::validation(format!("nesting under {parent} would exceed {MAX_TREE_DEPTH} levels")));
        }
        cursor = parent_of(conn, current).await?;
    }
    Ok(())
}

async fn parent_of<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<Uuid>, ServiceError> {
    let row: Option<Option<Uuid>> = content_entry::Entity::find_by_id(id)
        .select_only()
        .column(content_entry::Column::ParentId)
        .into_tuple()
        .one(conn)
        .await?;
    Ok(row.flatten())
}

/// Entry with its children, siblings sorted by order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub entry: content_entry::Model,
    pub children: Vec<TreeNode>,
}

type ByParent = HashMap<Option<Uuid>, Vec<content_entry::Model>>;

/// Assemble a forest from flat rows. Every row ends up in exactly one node:
/// rows whose parent is not in `rows`, and rows only reachable through a
/// parent cycle, become roots.
pub fn build_forest(rows: Vec<content_entry::Model>) -> Vec<TreeNode> {
    let ids: HashSet<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut by_parent: ByParent = HashMap::new();
    for row in rows {
        let key = row.parent_id.filter(|p| ids.contains(p));
        by_parent.entry(key).or_default().push(row);
    }
    let mut forest = attach(None, &mut by_parent);
    while let Some(key) = by_parent.keys().next().copied() {
        let mut stranded = attach(key, &mut by_parent);
        forest.append(&mut stranded);
    }
    forest
}

/// Each parent group is taken out of `by_parent` once, so a cycle ends the
/// descent instead of looping.
fn attach(parent: Option<Uuid>, by_parent: &mut ByParent) -> Vec<TreeNode> {
    let mut level = by_parent.remove(&parent).unwrap_or_default();
    level.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.created_at.cmp(&b.created_at)));
    level
        .into_iter()
        .map(|entry| {
            let children = attach(Some(entry.id), by_parent);
            TreeNode { entry, children }
        })
        .collect()
}
