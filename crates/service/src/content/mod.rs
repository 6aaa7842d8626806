//! Ordered content: CRUD over every kind, batched reorder and the tree rules
//! for kinds with a parent.

pub mod query;
pub mod service;
pub mod tree;

pub use query::{DeleteOutcome, EntryPage, ListQuery, ReorderItem, SortDirection};
pub use service::ContentService;
pub use tree::TreeNode;
