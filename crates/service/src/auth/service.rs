use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, instrument, warn};

use super::domain::{AuthSession, Claims, LoginInput};
use super::errors::AuthError;

const SUBJECT: &str = "admin";

/// Auth business service independent of web framework
#[derive(Clone)]
pub struct AdminAuthService {
    password_hash: String,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AdminAuthService {
    pub fn new(password_hash: impl Into<String>, jwt_secret: impl Into<String>, token_ttl_hours: i64) -> Self {
        Self { password_hash: password_hash.into(), jwt_secret: jwt_secret.into(), token_ttl_hours }
    }

    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self::new(cfg.admin_password_hash.clone(), cfg.jwt_secret.clone(), cfg.token_ttl_hours)
    }

    /// Check the admin password and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AdminAuthService, hash_password}, domain::LoginInput};
    /// let hash = hash_password("Passw0rd!").unwrap();
    /// let svc = AdminAuthService::new(hash, "0123456789abcdef0123", 12);
    /// let session = svc.login(LoginInput { password: "Passw0rd!".into() }).unwrap();
    /// assert_eq!(svc.verify_token(&session.token).unwrap().sub, "admin");
    /// ```
    #[instrument(skip(self, input))]
    pub fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if input.password.is_empty() {
            return Err(AuthError::Validation("password is required".into()));
        }
        let parsed = PasswordHash::new(&self.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            warn!("admin login rejected");
            return Err(AuthError::Unauthorized);
        }

        let now = Utc::now();
        let exp = (now + chrono::Duration::hours(self.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: SUBJECT.into(), iat: now.timestamp() as usize, exp };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        info!(expires_at = exp, "admin_logged_in");
        Ok(AuthSession { token, expires_at: exp })
    }

    /// Validate signature and expiry of a token issued by `login`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.jwt_secret.as_bytes()), &Validation::default())
            .map_err(|_| AuthError::Unauthorized)?;
        if data.claims.sub != SUBJECT {
            return Err(AuthError::Unauthorized);
        }
        Ok(data.claims)
    }
}

/// Argon2 PHC string for `password`, as stored in `auth.admin_password_hash`.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.len() < 8 {
        return Err(AuthError::Validation("password too short (>=8)".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}
