//! Service layer of the site CMS.
//! - Ordered content CRUD, reorder batches and tree consistency (`content`).
//! - Media staging, confirmation and release (`media`) over pluggable blob
//!   storage (`storage`).
//! - Admin session issuing and checking (`auth`).

pub mod errors;
pub mod auth;
pub mod content;
pub mod media;
pub mod metrics;
pub mod retry;
pub mod runtime;
pub mod storage;
#[cfg(test)]
pub mod test_support;

pub use content::ContentService;
pub use errors::ServiceError;
pub use media::MediaService;
