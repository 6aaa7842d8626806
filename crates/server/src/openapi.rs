use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub password: String }

/// Placement envelope; the kind-specific fields sit next to these keys.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct EntryRequestDoc {
    pub order: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub media_asset_id: Option<Uuid>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ReorderItemDoc {
    pub id: String,
    pub order: i32,
    pub parent_id: Option<String>,
}

#[derive(ToSchema)]
pub struct ReorderRequestDoc { pub items: Vec<ReorderItemDoc> }

#[derive(ToSchema)]
pub struct ConfirmRequestDoc { pub ids: Vec<Uuid> }

#[allow(dead_code)]
#[derive(IntoParams)]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListParams {
    /// Only children of this parent
    pub parent_id: Option<Uuid>,
    /// Only root entries
    pub roots: Option<bool>,
    /// `asc` (default) or `desc`
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::content::list,
        crate::routes::content::get_entry,
        crate::routes::content::menu_tree,
        crate::routes::content::settings_map,
        crate::routes::content::create,
        crate::routes::content::update,
        crate::routes::content::delete,
        crate::routes::content::reorder,
        crate::routes::media::upload,
        crate::routes::media::list,
        crate::routes::media::confirm,
        crate::routes::media::delete,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            EntryRequestDoc,
            ReorderItemDoc,
            ReorderRequestDoc,
            ConfirmRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "content"),
        (name = "admin"),
        (name = "media")
    )
)]
pub struct ApiDoc;
