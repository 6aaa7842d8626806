//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::info;

/// Ensure the data and media directories exist, creating them when missing.
pub async fn ensure_env(data_dir: &str, media_dir: &str) -> anyhow::Result<()> {
    for dir in [data_dir, media_dir] {
        if tokio::fs::metadata(dir).await.is_err() {
            info!(%dir, "creating missing directory");
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {dir}: {e}"))?;
    }
    Ok(())
}
