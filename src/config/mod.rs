use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use anyhow::{Result, Context};
use log::debug;

/// Which account store backend to use
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A single pretty-printed JSON document keyed by username
    Json,
    /// An embedded SQLite database
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(&self) -> &str {
        match self {
            StorageBackend::Json => "json",
            StorageBackend::Sqlite => "sqlite",
        }
    }
}

/// Account store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend used to persist accounts
    pub backend: StorageBackend,
    /// Path to the JSON document or SQLite database file
    pub path: String,
}

/// Audit configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditConfig {
    /// Path to the CSV transaction log
    pub log_path: String,
}

/// Security configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Consecutive failed PIN entries before the reset flow is offered
    pub max_failed_attempts: u32,
}

/// Global application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Application name, shown in the menu banner
    pub app_name: String,
    /// Application version
    pub version: String,
    /// Account store configuration
    pub storage: StorageConfig,
    /// Audit configuration
    pub audit: AuditConfig,
    /// Security configuration
    pub security: SecurityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Cactus Bank".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig {
                backend: StorageBackend::Json,
                path: "customers.json".to_string(),
            },
            audit: AuditConfig {
                log_path: "transactions.csv".to_string(),
            },
            security: SecurityConfig {
                max_failed_attempts: 3,
            },
        }
    }
}

/// Load configuration from file, writing the defaults if it does not exist yet
pub fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        debug!("No configuration at {}, writing defaults", path);
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

    if config.security.max_failed_attempts == 0 {
        anyhow::bail!("security.max_failed_attempts must be at least 1");
    }

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
