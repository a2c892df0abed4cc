//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication and token configuration.
    pub auth: AuthConfig,
    /// Outbound mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Uploaded file storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Feed settings.
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance, used in password reset links.
    #[serde(default = "default_url")]
    pub url: String,
    /// Per-request timeout applied at the transport boundary.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Log output format: `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Signing secret and token lifetimes.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Server-held secret for signing reset and session tokens.
    pub secret_key: String,
    /// Password reset token lifetime in seconds.
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_secs: u64,
    /// Session token lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Session token lifetime when "remember me" is set.
    #[serde(default = "default_remember_ttl")]
    pub remember_ttl_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("reset_token_ttl_secs", &self.reset_token_ttl_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("remember_ttl_secs", &self.remember_ttl_secs)
            .finish()
    }
}

/// Outbound mail configuration. Without `smtp_host` mail is only logged.
#[derive(Clone, Deserialize)]
pub struct MailConfig {
    /// Sender address.
    #[serde(default = "default_sender")]
    pub sender: String,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("sender", &self.sender)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Uploaded file storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory profile pictures are written to.
    #[serde(default = "default_profile_pics_path")]
    pub profile_pics_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profile_pics_path: default_profile_pics_path(),
        }
    }
}

/// Feed settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Posts per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_reset_token_ttl() -> u64 {
    1800
}

const fn default_session_ttl() -> u64 {
    86_400
}

const fn default_remember_ttl() -> u64 {
    365 * 86_400
}

fn default_sender() -> String {
    "noreply@demo.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_profile_pics_path() -> PathBuf {
    PathBuf::from("./static/profile_pics")
}

/// Default number of posts per feed page.
pub const DEFAULT_PAGE_SIZE: u64 = 5;

const fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `INKWELL_ENV`)
    /// 3. Environment variables with `INKWELL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("INKWELL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("INKWELL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("INKWELL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.secret_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "auth.secret_key must not be empty".to_string(),
            ));
        }
        if self.feed.page_size == 0 {
            return Err(config::ConfigError::Message(
                "feed.page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
