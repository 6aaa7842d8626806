//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can prepare the data
//! and media directories through `service::runtime::ensure_env`.

/// Ensure the data and media storage directories exist.
pub async fn ensure_env(data_dir: &str, media_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_env(data_dir, media_dir).await
}
