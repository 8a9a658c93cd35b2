//! Configuration loading and validation

use anyhow::{Context, Result, bail};
use chrono::Duration;
use pizzeria_auth::{TokenSettings, parse_algorithms};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Full connection URL; takes precedence over `path`
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            url: None,
        }
    }
}

impl DatabaseConfig {
    /// Connection URL for sqlx
    pub fn connection_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("sqlite:{}?mode=rwc", self.path))
    }
}

/// Signing algorithm setting: a single name or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmSetting {
    One(String),
    Many(Vec<String>),
}

impl AlgorithmSetting {
    /// Parse a comma-separated value such as `HS256` or `HS512,HS256`
    pub fn from_list(value: &str) -> Self {
        let names: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        match names.as_slice() {
            [single] => AlgorithmSetting::One(single.clone()),
            _ => AlgorithmSetting::Many(names),
        }
    }

    pub fn names(&self) -> Vec<String> {
        match self {
            AlgorithmSetting::One(name) => vec![name.clone()],
            AlgorithmSetting::Many(names) => names.clone(),
        }
    }
}

impl Default for AlgorithmSetting {
    fn default() -> Self {
        AlgorithmSetting::One("HS256".to_string())
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret; there is deliberately no default
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub algorithm: AlgorithmSetting,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_token_expire_minutes")]
    pub refresh_token_expire_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: AlgorithmSetting::default(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            refresh_token_expire_minutes: default_refresh_token_expire_minutes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "./data/pizzeria.db".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    pizzeria_auth::jwt::DEFAULT_ACCESS_TTL_MINUTES
}

fn default_refresh_token_expire_minutes() -> i64 {
    pizzeria_auth::jwt::DEFAULT_REFRESH_TTL_MINUTES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check the token settings and build them
    ///
    /// Called once at startup so that a bad secret, algorithm or lifetime
    /// stops the process instead of failing individual requests.
    pub fn token_settings(&self) -> Result<TokenSettings> {
        let auth = &self.auth;

        if auth.secret_key.trim().is_empty() {
            bail!("auth.secret_key is not set (use the config file or SECRET_KEY)");
        }
        if auth.access_token_expire_minutes <= 0 {
            bail!(
                "auth.access_token_expire_minutes must be positive, got {}",
                auth.access_token_expire_minutes
            );
        }
        if auth.refresh_token_expire_minutes <= 0 {
            bail!(
                "auth.refresh_token_expire_minutes must be positive, got {}",
                auth.refresh_token_expire_minutes
            );
        }

        let algorithms =
            parse_algorithms(auth.algorithm.names().as_slice()).context("Invalid auth.algorithm")?;

        let mut settings = TokenSettings::new(auth.secret_key.clone(), algorithms);
        settings.access_ttl = minutes(
            "auth.access_token_expire_minutes",
            auth.access_token_expire_minutes,
        )?;
        settings.refresh_ttl = minutes(
            "auth.refresh_token_expire_minutes",
            auth.refresh_token_expire_minutes,
        )?;
        Ok(settings)
    }
}

fn minutes(key: &str, value: i64) -> Result<Duration> {
    Duration::try_minutes(value).with_context(|| format!("{} is out of range: {}", key, value))
}
