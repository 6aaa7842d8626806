//! Persistence models for the site CMS: SeaORM entities, connection helpers
//! and the payload validation gate applied before anything is written.

pub mod errors;
pub mod db;
pub mod kind;
pub mod payload;
pub mod content_entry;
pub mod media_asset;
