use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::warn;

use service::auth::domain::LoginInput;

use crate::{errors::ApiError, state::AppState};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput {
    pub token: String,
    pub expires_at: usize,
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input)?;

    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOutput { token: session.token, expires_at: session.expires_at })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

/// Admin guard: accepts `Authorization: Bearer <token>` or the session
/// cookie. Anything else is answered with 401.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").map(str::to_string));

    let token = match bearer {
        Some(Some(t)) => t,
        Some(None) => {
            warn!(%path, "invalid Authorization format (expect Bearer)");
            return Err(ApiError::unauthorized());
        }
        None => match CookieJar::from_headers(req.headers()).get(AUTH_COOKIE) {
            Some(c) if !c.value().is_empty() => c.value().to_string(),
            _ => {
                warn!(%path, "missing Authorization header and auth_token cookie");
                return Err(ApiError::unauthorized());
            }
        },
    };

    if let Err(e) = state.auth.verify_token(&token) {
        warn!(%path, error = %e, "token validation failed");
        return Err(ApiError::unauthorized());
    }
    Ok(next.run(req).await)
}
