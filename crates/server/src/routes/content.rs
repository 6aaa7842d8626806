use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::{kind::EntityKind, payload::{EntryInput, EntryPatch}};
use service::content::{ListQuery, ReorderItem};

use crate::{errors::ApiError, state::AppState};

fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
    raw.parse::<EntityKind>().map_err(|e| ApiError::not_found(e.to_string()))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("'{raw}' is not a valid id")))
}

#[utoipa::path(
    get, path = "/api/{kind}", tag = "content",
    params(("kind" = String, Path, description = "Content kind, e.g. faqs or menu-items"), crate::openapi::ListParams),
    responses((status = 200, description = "Entries in order"), (status = 404, description = "Unknown kind"))
)]
pub async fn list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let Query(q) = query?;
    let page = state.content.list(kind, &q).await?;
    Ok(Json(page).into_response())
}

/// `GET /api/:kind/:id`, also serving the `menu-items/tree` and
/// `settings/map` views.
#[utoipa::path(
    get, path = "/api/{kind}/{id}", tag = "content",
    params(("kind" = String, Path,), ("id" = String, Path,)),
    responses((status = 200, description = "Entry"), (status = 400, description = "Malformed id"), (status = 404, description = "Not found"))
)]
pub async fn get_entry(State(state): State<AppState>, Path((kind, id)): Path<(String, String)>) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    match (kind, id.as_str()) {
        (EntityKind::MenuItem, "tree") => menu_tree(state).await,
        (EntityKind::SiteSetting, "map") => settings_map(state).await,
        _ => {
            let id = parse_id(&id)?;
            Ok(Json(state.content.get(kind, id).await?).into_response())
        }
    }
}

#[utoipa::path(get, path = "/api/menu-items/tree", tag = "content", responses((status = 200, description = "Menu as nested tree")))]
pub async fn menu_tree(state: AppState) -> Result<Response, ApiError> {
    Ok(Json(state.content.menu_tree().await?).into_response())
}

#[utoipa::path(get, path = "/api/settings/map", tag = "content", responses((status = 200, description = "Settings as key/value object")))]
pub async fn settings_map(state: AppState) -> Result<Response, ApiError> {
    Ok(Json(state.content.settings_map().await?).into_response())
}

#[utoipa::path(
    post, path = "/admin/content/{kind}", tag = "admin",
    params(("kind" = String, Path,)),
    request_body = crate::openapi::EntryRequestDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 401, description = "Unauthorized"), (status = 409, description = "Conflict"))
)]
pub async fn create(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<EntryInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(input) = payload?;
    let row = state.content.create(kind, input).await?;
    info!(%kind, id = %row.id, "content_create");
    Ok((StatusCode::CREATED, Json(row)).into_response())
}

#[utoipa::path(
    patch, path = "/admin/content/{kind}/{id}", tag = "admin",
    params(("kind" = String, Path,), ("id" = String, Path,)),
    request_body = crate::openapi::EntryRequestDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not found"))
)]
pub async fn update(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let row = state.content.update(kind, id, patch).await?;
    Ok(Json(row).into_response())
}

#[utoipa::path(
    delete, path = "/admin/content/{kind}/{id}", tag = "admin",
    params(("kind" = String, Path,), ("id" = String, Path,)),
    responses((status = 200, description = "Deleted with subtree"), (status = 404, description = "Not found"))
)]
pub async fn delete(State(state): State<AppState>, Path((kind, id)): Path<(String, String)>) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let outcome = state.content.delete(kind, id).await?;
    info!(%kind, %id, deleted = outcome.deleted, "content_delete");
    Ok(Json(outcome).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

#[utoipa::path(
    post, path = "/admin/content/{kind}/reorder", tag = "admin",
    params(("kind" = String, Path,)),
    request_body = crate::openapi::ReorderRequestDoc,
    responses((status = 200, description = "Batch applied"), (status = 400, description = "Validation Error"), (status = 404, description = "Unknown id, nothing applied"))
)]
pub async fn reorder(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(req) = payload?;
    let rows = state.content.reorder(kind, req.items).await?;
    Ok(Json(rows).into_response())
}
