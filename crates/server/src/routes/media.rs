use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{errors::ApiError, state::AppState};

#[utoipa::path(
    post, path = "/admin/media", tag = "media",
    request_body(content = String, content_type = "image/*", description = "Raw image bytes"),
    responses((status = 201, description = "Staged"), (status = 400, description = "Not an image"), (status = 413, description = "Too large"))
)]
pub async fn upload(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Response, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let asset = state.media.stage(body.to_vec(), &content_type).await?;
    info!(asset_id = %asset.id, key = %asset.storage_key, "media_upload");
    Ok((StatusCode::CREATED, Json(asset)).into_response())
}

#[utoipa::path(get, path = "/admin/media", tag = "media", responses((status = 200, description = "Assets, newest first")))]
pub async fn list(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.media.list().await?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmOutput {
    pub confirmed: u64,
}

#[utoipa::path(
    post, path = "/admin/media/confirm", tag = "media",
    request_body = crate::openapi::ConfirmRequestDoc,
    responses((status = 200, description = "Count of assets moved to active"))
)]
pub async fn confirm(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let confirmed = state.media.confirm(&req.ids).await?;
    Ok(Json(ConfirmOutput { confirmed }).into_response())
}

#[utoipa::path(
    delete, path = "/admin/media/{id}", tag = "media",
    params(("id" = String, Path,)),
    responses((status = 204, description = "Released"), (status = 404, description = "Not found"), (status = 409, description = "Still referenced"))
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request(format!("'{id}' is not a valid id")))?;
    state.media.delete_asset(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
