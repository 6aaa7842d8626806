use axum::{
    extract::DefaultBodyLimit,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::{error, Level};

use common::types::Health;

use crate::{openapi::ApiDoc, state::AppState};

pub mod auth;
pub mod content;
pub mod media;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> impl IntoResponse {
    match service::metrics::encode_metrics() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body),
        Err(e) => {
            error!(error = %e, "metrics encode error");
            (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, "text/plain")], String::new())
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}

/// Everything a router needs besides the handler state.
pub struct RouterOptions {
    pub cors: CorsLayer,
    /// Directory served under `/media`; `None` leaves static media out.
    pub media_dir: Option<String>,
    pub max_upload_bytes: usize,
}

/// Build the full application router: public reads, auth, admin mutations
/// behind the session check, media upload and static media.
pub fn build_router(state: AppState, opts: RouterOptions) -> Router {
    // Public routes (health, metrics, docs, content reads)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/api/:kind", get(content::list))
        .route("/api/:kind/:id", get(content::get_entry))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    // Admin routes
    let admin = Router::new()
        .route("/admin/content/:kind", post(content::create))
        .route("/admin/content/:kind/reorder", post(content::reorder))
        .route("/admin/content/:kind/:id", patch(content::update).delete(content::delete))
        .route(
            "/admin/media",
            get(media::list).post(media::upload).layer(DefaultBodyLimit::max(opts.max_upload_bytes.saturating_add(1))),
        )
        .route("/admin/media/confirm", post(media::confirm))
        .route("/admin/media/:id", delete(media::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    let mut app = public.merge(admin).with_state(state);
    if let Some(dir) = opts.media_dir {
        app = app.nest_service("/media", ServeDir::new(dir));
    }

    app.layer(opts.cors).layer(
        TraceLayer::new_for_http()
            // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            // 响应返回时打点，包含状态码与耗时
            .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
            // 失败（5xx 等）时以 ERROR 记录
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
