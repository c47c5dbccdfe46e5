// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! TOML file, then `SOCIAL_`-prefixed environment variables where `__`
//! separates nesting levels (`SOCIAL_AUTH__TOKEN_TTL_SECS=900`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "social.toml";
/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SOCIAL_";
/// Shortest HMAC secret accepted for signing tokens.
pub const MIN_SECRET_LENGTH: usize = 32;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub rate_limit: RateLimitSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bad bind address: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Directory holding one sub-directory per database.
    pub path: PathBuf,
    /// Database selected at start-up.
    pub database: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data"),
            database: "social_network".to_string(),
        }
    }
}

impl StorageSettings {
    pub fn database_dir(&self) -> PathBuf {
        self.path.join(&self.database)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for bearer tokens. Generated at start-up when unset.
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: u64,
    /// Accounts registered with one of these emails get the admin role.
    pub admin_emails: Vec<String>,
    pub max_login_attempts: u32,
    pub lockout_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 30 * 60,
            admin_emails: Vec::new(),
            max_login_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl AuthSettings {
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load from defaults, `path` (or `social.toml` if present) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        figment = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingFile(path.to_path_buf()));
                }
                figment.merge(Toml::file(path))
            },
            None => figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        };
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level `{}`",
                self.log.level
            )));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_secs must be positive".into()));
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "auth.jwt_secret must be at least {MIN_SECRET_LENGTH} bytes"
                )));
            }
        }
        if self.auth.max_login_attempts == 0 {
            return Err(ConfigError::Invalid("auth.max_login_attempts must be positive".into()));
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid("rate_limit values must be positive".into()));
        }
        if crate::storage::check_identifier(&self.storage.database).is_err() {
            return Err(ConfigError::Invalid(format!(
                "storage.database `{}` must be alphanumeric",
                self.storage.database
            )));
        }
        self.server.bind_addr()?;
        Ok(())
    }
}
