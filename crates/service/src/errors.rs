use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn not_found(what: impl std::fmt::Display) -> Self { Self::NotFound(format!("{what} not found")) }

    /// Failures worth another attempt from a background job.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Db(_) | ServiceError::Storage(_) | ServiceError::Internal(_))
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(m) => Self::Validation(m),
            models::errors::ModelError::Db(m) => Self::Db(m),
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict("an entry with the same unique key already exists".into()),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Self::Conflict("the record is still referenced".into()),
            _ => Self::Db(e.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => Self::NotFound(format!("object {key} not found")),
            StorageError::Io(m) => Self::Storage(m),
        }
    }
}
