use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::pagination::Pagination;
use models::content_entry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Query string of list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Only children of this parent.
    pub parent_id: Option<Uuid>,
    /// Only entries without a parent; ignored when `parentId` is set.
    #[serde(default)]
    pub roots: bool,
    #[serde(default)]
    pub sort: SortDirection,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        let d = Pagination::default();
        Pagination { page: self.page.unwrap_or(d.page), per_page: self.per_page.unwrap_or(d.per_page) }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPage {
    pub items: Vec<content_entry::Model>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// One line of a reorder batch. Ids stay strings here so malformed values
/// surface as validation errors of the batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    pub id: String,
    pub order: i32,
    /// Absent keeps the current parent; `null` moves the entry to the root.
    #[serde(default, deserialize_with = "models::payload::double_option")]
    pub parent_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    /// Entries removed, the target and its descendants.
    pub deleted: usize,
    pub released_media: usize,
}
