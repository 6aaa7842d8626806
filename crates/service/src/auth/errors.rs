use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Unauthorized => 1004,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
        }
    }
}

impl From<AuthError> for crate::errors::ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => Self::Validation(m),
            AuthError::Unauthorized => Self::Unauthorized,
            other => Self::Internal(other.to_string()),
        }
    }
}
