use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use common::types::ErrorBody;
use service::{auth::errors::AuthError, ServiceError};

/// Error answered as `{ "error": message }` with the given status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn unauthorized() -> Self { Self::new(StatusCode::UNAUTHORIZED, "unauthorized") }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, message) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::bad_request(m),
            ServiceError::NotFound(m) => Self::not_found(m),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, m),
            ServiceError::Unauthorized => Self::unauthorized(),
            ServiceError::Storage(m) => {
                error!(error = %m, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
            }
            other => {
                error!(error = %other, "unexpected service error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => Self::bad_request(m),
            AuthError::Unauthorized => Self::unauthorized(),
            other => {
                error!(error = %other, code = other.code(), "auth failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self { Self::bad_request(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self { Self::bad_request(e.body_text()) }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
