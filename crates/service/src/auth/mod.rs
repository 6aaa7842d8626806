//! Admin session: a single configured password, verified with argon2, traded
//! for a short-lived HS256 token.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::AdminAuthService;
