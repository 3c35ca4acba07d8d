use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use anyhow::{Result, Context};
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

lazy_static! {
    static ref SQL_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Configuration errors detected after parsing
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid user table name: {0}")]
    InvalidTableName(String),
}

/// Database configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum number of connections in the connection pool
    pub max_connections: u32,
    /// Table holding the frontend user records
    pub user_table: String,
}

/// Password complexity rules applied to a new password.
///
/// Every rule is off unless configured.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PasswordComplexityPolicy {
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(rename = "capitalCharCheck", default)]
    pub require_uppercase: bool,
    #[serde(rename = "lowerCaseCharCheck", default)]
    pub require_lowercase: bool,
    #[serde(rename = "digitCheck", default)]
    pub require_digit: bool,
    #[serde(rename = "specialCharCheck", default)]
    pub require_special_char: bool,
}

/// Computes the expiry timestamp written after a successful password change
pub trait ExpiryPolicy {
    /// Unix timestamp of the next expiry, `0` when passwords never expire
    fn next_expiry(&self, now: DateTime<Utc>) -> i64;
}

/// Password expiration settings
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PasswordExpiryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "validityInDays", default)]
    pub validity_in_days: u32,
}

impl ExpiryPolicy for PasswordExpiryConfig {
    fn next_expiry(&self, now: DateTime<Utc>) -> i64 {
        if !self.enabled {
            return 0;
        }
        now.checked_add_signed(Duration::days(i64::from(self.validity_in_days)))
            .map(|expiry| expiry.timestamp())
            .unwrap_or(i64::MAX)
    }
}

/// Password hashing configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HashingConfig {
    /// Hash algorithm, only `argon2id` is accepted
    pub algorithm: String,
    /// Memory cost in kibibytes
    pub memory_cost_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: "argon2id".to_string(),
            memory_cost_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Localization configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LocalizationConfig {
    /// Optional TOML file overriding the built-in messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

/// Application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Hashing configuration
    #[serde(default)]
    pub hashing: HashingConfig,
    #[serde(rename = "passwordComplexity", default)]
    pub password_complexity: PasswordComplexityPolicy,
    #[serde(rename = "passwordExpiration", default)]
    pub password_expiration: PasswordExpiryConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Frontend Password Change".to_string(),
            database: DatabaseConfig {
                path: "data/fe_users.db".to_string(),
                max_connections: 4,
                user_table: "fe_users".to_string(),
            },
            hashing: HashingConfig::default(),
            password_complexity: PasswordComplexityPolicy::default(),
            password_expiration: PasswordExpiryConfig::default(),
            localization: LocalizationConfig::default(),
        }
    }
}

/// Whether a name can be spliced into SQL as a table name
pub fn is_sql_identifier(name: &str) -> bool {
    SQL_IDENTIFIER.is_match(name)
}

impl Config {
    /// Checks values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_sql_identifier(&self.database.user_table) {
            return Err(ConfigError::InvalidTableName(self.database.user_table.clone()));
        }
        Ok(())
    }
}

/// Load configuration from file, writing the defaults when it does not exist
pub fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        info!("No configuration at {}, writing defaults", path);
        let default_config = Config::default();
        save_config(path, &default_config)?;
        return Ok(default_config);
    }

    let mut file = File::open(path).context(format!("Failed to open config file: {}", path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).context("Failed to read config file")?;

    let config: Config = match path.ends_with(".toml") {
        true => toml::from_str(&contents).context("Failed to parse TOML config")?,
        false => serde_json::from_str(&contents).context("Failed to parse JSON config")?,
    };

    config.validate().context(format!("Invalid configuration in {}", path))?;
    debug!("Configuration loaded from {}", path);

    Ok(config)
}

/// Save configuration to file
pub fn save_config(path: &str, config: &Config) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
    }

    let serialized = match path.ends_with(".toml") {
        true => toml::to_string_pretty(config).context("Failed to serialize config to TOML")?,
        false => serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?,
    };

    std::fs::write(path, serialized).context(format!("Failed to write config to file: {}", path))?;

    Ok(())
}
