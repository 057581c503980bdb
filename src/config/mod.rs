//! Configuration management
//!
//! This module handles loading and parsing configuration for spendlog.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::CategoryDef;
use crate::services::expense::MAX_PAGE_SIZE;

/// Longest session lifetime accepted from configuration
pub const MAX_SESSION_LIFETIME_DAYS: i64 = 3650;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Bootstrap administrator credentials
    #[serde(default)]
    pub admin: AdminConfig,
    /// Expense list configuration
    #[serde(default)]
    pub expenses: ExpensesConfig,
    /// Category catalog used for display styling
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryDef>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, `sqlite:` URL or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/expenses.db".to_string()
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Full session lifetime in days
    #[serde(default = "default_lifetime_days")]
    pub lifetime_days: i64,
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Mark the cookie `Secure` (serve over TLS)
    #[serde(default)]
    pub secure_cookie: bool,
    /// Interval between expired-session sweeps
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_days: default_lifetime_days(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl SessionConfig {
    /// Session lifetime as a duration, kept within the accepted range
    pub fn lifetime(&self) -> Duration {
        Duration::days(self.lifetime_days.clamp(1, MAX_SESSION_LIFETIME_DAYS))
    }
}

fn default_lifetime_days() -> i64 {
    30
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_cleanup_interval() -> u64 {
    3600
}

/// Credentials for the first administrator.
///
/// Only consulted when the users table is empty. When either value is
/// missing an `admin` account with a generated password is created instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Expense list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpensesConfig {
    /// Rows per page of the infinite-scroll list
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Default for ExpensesConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> i64 {
    20
}

fn default_categories() -> Vec<CategoryDef> {
    vec![
        CategoryDef::new("food", "Food", "🍽️", "#60a5fa"),
        CategoryDef::new("transport", "Transport", "🚌", "#a78bfa"),
        CategoryDef::new("entertainment", "Entertainment", "🎮", "#f472b6"),
        CategoryDef::new("utilities", "Utilities", "💡", "#fbbf24"),
        CategoryDef::new("housing", "Housing", "🏠", "#818cf8"),
        CategoryDef::new("gifts", "Gifts", "🎁", "#fb7185"),
        CategoryDef::new("other", "Other", "📦", "#94a3b8"),
    ]
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default_with_catalog());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default_with_catalog());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject numeric settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_LIFETIME_DAYS).contains(&self.session.lifetime_days) {
            return Err(ConfigError::InvalidValue {
                field: "session.lifetime_days",
                message: format!(
                    "{} is outside 1..={}",
                    self.session.lifetime_days, MAX_SESSION_LIFETIME_DAYS
                ),
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.expenses.page_size) {
            return Err(ConfigError::InvalidValue {
                field: "expenses.page_size",
                message: format!("{} is outside 1..={}", self.expenses.page_size, MAX_PAGE_SIZE),
            });
        }
        Ok(())
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - SPENDLOG_SERVER_HOST
    /// - SPENDLOG_SERVER_PORT
    /// - SPENDLOG_DATABASE_URL
    /// - SPENDLOG_SESSION_LIFETIME_DAYS
    /// - SPENDLOG_SESSION_COOKIE_NAME
    /// - SPENDLOG_SESSION_SECURE_COOKIE
    /// - SPENDLOG_ADMIN_USERNAME
    /// - SPENDLOG_ADMIN_PASSWORD
    /// - SPENDLOG_EXPENSES_PAGE_SIZE
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults including the built-in category catalog, which the derived
    /// `Default` leaves empty.
    pub fn default_with_catalog() -> Self {
        Self {
            categories: default_categories(),
            ..Self::default()
        }
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SPENDLOG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SPENDLOG_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(url) = std::env::var("SPENDLOG_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(days) = std::env::var("SPENDLOG_SESSION_LIFETIME_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                if (1..=MAX_SESSION_LIFETIME_DAYS).contains(&days) {
                    self.session.lifetime_days = days;
                }
            }
        }
        if let Ok(name) = std::env::var("SPENDLOG_SESSION_COOKIE_NAME") {
            if !name.trim().is_empty() {
                self.session.cookie_name = name;
            }
        }
        if let Ok(secure) = std::env::var("SPENDLOG_SESSION_SECURE_COOKIE") {
            match secure.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.session.secure_cookie = true,
                "false" | "0" | "no" => self.session.secure_cookie = false,
                _ => {} // Ignore invalid values
            }
        }

        if let Ok(username) = std::env::var("SPENDLOG_ADMIN_USERNAME") {
            self.admin.username = Some(username);
        }
        if let Ok(password) = std::env::var("SPENDLOG_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }

        if let Ok(size) = std::env::var("SPENDLOG_EXPENSES_PAGE_SIZE") {
            if let Ok(size) = size.parse::<i64>() {
                if (1..=MAX_PAGE_SIZE).contains(&size) {
                    self.expenses.page_size = size;
                }
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
