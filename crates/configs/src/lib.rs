use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Upload pipeline, blob storage and staging lifecycle settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Longest edge after resizing, in pixels.
    pub max_dimension: u32,
    /// JPEG quality, 1..=100.
    pub quality: u8,
    pub max_upload_bytes: usize,
    /// Directory backing the local object storage.
    pub storage_dir: String,
    /// Prefix used to build public asset URLs.
    pub public_base_url: String,
    /// Staging assets older than this with no references are swept.
    pub staging_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub confirm_queue_capacity: usize,
    pub confirm_max_attempts: u32,
    pub confirm_backoff_base_ms: u64,
    pub confirm_backoff_max_ms: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            quality: 80,
            max_upload_bytes: 10 * 1024 * 1024,
            storage_dir: "data/media".into(),
            public_base_url: "/media".into(),
            staging_ttl_secs: 24 * 3600,
            sweep_interval_secs: 3600,
            confirm_queue_capacity: 256,
            confirm_max_attempts: 5,
            confirm_backoff_base_ms: 200,
            confirm_backoff_max_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Argon2 PHC string of the admin password.
    pub admin_password_hash: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), admin_password_hash: String::new(), token_ttl_hours: 12 }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// 配置文件缺失时，完全从环境变量构建配置
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.media.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url 为空；请在 config.toml 或环境变量 DATABASE_URL 中提供"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url 必须以 postgres://、postgresql:// 或 sqlite: 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}

impl MediaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(anyhow!("media.max_dimension 必须 > 0"));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(anyhow!("media.quality 必须在 1..=100 范围内"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("media.max_upload_bytes 必须 > 0"));
        }
        if self.storage_dir.trim().is_empty() {
            return Err(anyhow!("media.storage_dir 不能为空"));
        }
        if self.sweep_interval_secs == 0 || self.staging_ttl_secs == 0 {
            return Err(anyhow!("media.sweep_interval_secs 与 staging_ttl_secs 必须 > 0"));
        }
        if self.confirm_queue_capacity == 0 || self.confirm_max_attempts == 0 {
            return Err(anyhow!("media.confirm_queue_capacity 与 confirm_max_attempts 必须 > 0"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.admin_password_hash.trim().is_empty() {
            if let Ok(hash) = std::env::var("ADMIN_PASSWORD_HASH") {
                self.admin_password_hash = hash;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 16 {
            return Err(anyhow!("auth.jwt_secret 至少 16 个字符；请在 config.toml 或环境变量 JWT_SECRET 中提供"));
        }
        if !self.admin_password_hash.starts_with("$argon2") {
            return Err(anyhow!("auth.admin_password_hash 必须是 argon2 PHC 字符串"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours 必须 > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA";

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        f.write_all(body.as_bytes()).expect("write config");
        f
    }

    #[test]
    fn parses_full_file_and_applies_media_defaults() {
        let f = write_config(&format!(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost/site"

            [media]
            max_dimension = 1280

            [auth]
            jwt_secret = "0123456789abcdef0123"
            admin_password_hash = "{HASH}"
            "#
        ));
        let mut cfg = load_from_file(f.path().to_str().unwrap()).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.media.max_dimension, 1280);
        assert_eq!(cfg.media.quality, 80);
        assert_eq!(cfg.auth.token_ttl_hours, 12);
    }

    #[test]
    fn rejects_unsupported_database_scheme() {
        let cfg = DatabaseConfig { url: "mysql://localhost/site".into(), ..DatabaseConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_sqlite_urls() {
        let cfg = DatabaseConfig { url: "sqlite::memory:".into(), ..DatabaseConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let media = MediaConfig { quality: 0, ..MediaConfig::default() };
        assert!(media.validate().is_err());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let auth = AuthConfig { jwt_secret: "short".into(), admin_password_hash: HASH.into(), token_ttl_hours: 1 };
        assert!(auth.validate().is_err());
    }
}
