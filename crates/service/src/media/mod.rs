//! Media lifecycle: uploads start as `staging`, turn `active` once a
//! committed entry references them, and are released with their blob when
//! nothing references them anymore.

pub mod service;
pub mod transform;
pub mod worker;

pub use service::MediaService;
pub use transform::{ImageTransform, JpegTransform};
pub use worker::{spawn_confirm_worker, spawn_staging_sweeper, Confirmation, ConfirmQueue};
