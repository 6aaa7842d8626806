use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging_default;
use configs::AppConfig;
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{errors::StartupError, routes::{self, RouterOptions}, state::AppState};
use service::{
    auth::AdminAuthService,
    media::{spawn_confirm_worker, spawn_staging_sweeper, Confirmation, JpegTransform},
    retry::RetryPolicy,
    runtime,
    storage::{LocalObjectStorage, ObjectStorage},
    ContentService, MediaService,
};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config file first, environment variables as fallback.
fn load_config() -> Result<AppConfig, StartupError> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(file_err) => {
            warn!(error = %file_err, "config file unusable, falling back to environment");
            AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
        }
    }
}

/// Services wired together plus the background tasks feeding them.
pub struct Application {
    pub state: AppState,
    pub workers: Vec<JoinHandle<()>>,
}

/// Wire services over `db` and `storage`, spawning the confirm worker and
/// the staging sweeper. Needs a running tokio runtime.
pub fn build_application(cfg: &AppConfig, db: DatabaseConnection, storage: Arc<dyn ObjectStorage>) -> Application {
    let media = Arc::new(MediaService::new(db.clone(), storage, Arc::new(JpegTransform), cfg.media.clone()));
    let (queue, confirm_worker) =
        spawn_confirm_worker(media.clone(), RetryPolicy::from_config(&cfg.media), cfg.media.confirm_queue_capacity);
    let sweeper = spawn_staging_sweeper(
        media.clone(),
        Duration::from_secs(cfg.media.staging_ttl_secs),
        Duration::from_secs(cfg.media.sweep_interval_secs),
    );
    let content = Arc::new(ContentService::new(db, media.clone(), Confirmation::Queued(queue)));
    let auth = Arc::new(AdminAuthService::from_config(&cfg.auth));
    Application { state: AppState { content, media, auth }, workers: vec![confirm_worker, sweeper] }
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    routes::build_router(
        state,
        RouterOptions {
            cors: build_cors(),
            media_dir: Some(cfg.media.storage_dir.clone()),
            max_upload_bytes: cfg.media.max_upload_bytes,
        },
    )
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config()?;
    runtime::ensure_env("data", &cfg.media.storage_dir).await?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;
    info!("migrations applied");

    let storage: Arc<dyn ObjectStorage> = Arc::new(LocalObjectStorage::from_config(&cfg.media));
    let application = build_application(&cfg, db, storage);
    let app = build_app(application.state, &cfg);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    for worker in application.workers {
        worker.abort();
    }
    Ok(())
}
