//! # Configuration
//!
//! Settings for binaries and tooling that open a Hearth database.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HEARTH_DATABASE_PATH=/var/lib/hearth/hearth.db                     │
//! │     HEARTH_MAX_CONNECTIONS=8                                           │
//! │     HEARTH_LOG=debug                                                   │
//! │     HEARTH_TENANT_ID=bakery-42                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hearth/hearth.toml (Linux)                               │
//! │     ~/Library/Application Support/com.hearth.hearth/hearth.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/hearth/hearth.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! run_migrations = true
//!
//! [logging]
//! filter = "info,hearth_db=debug"
//!
//! [tenant]
//! id = "00000000-0000-0000-0000-000000000001"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;
use hearth_core::DEFAULT_TENANT_ID;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created if missing.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("hearth.db"))
        .unwrap_or_else(|| PathBuf::from("hearth.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: true,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins over it.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

/// `[tenant]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Tenant used by tooling (seed, maintenance scripts).
    #[serde(default = "default_tenant_id")]
    pub id: String,
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

impl Default for TenantSettings {
    fn default() -> Self {
        TenantSettings {
            id: default_tenant_id(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HearthConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub tenant: TenantSettings,
}

impl HearthConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (hearth.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "database.min_connections cannot exceed max_connections".into(),
            ));
        }

        if self.tenant.id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant.id must not be empty".into()));
        }

        Ok(())
    }

    /// Applies `HEARTH_*` overrides from `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("HEARTH_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("HEARTH_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid HEARTH_MAX_CONNECTIONS"),
            }
        }

        if let Some(filter) = lookup("HEARTH_LOG") {
            self.logging.filter = filter;
        }

        if let Some(tenant) = lookup("HEARTH_TENANT_ID") {
            self.tenant.id = tenant;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("hearth.toml"))
    }

    /// Pool configuration for [`crate::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .run_migrations(self.database.run_migrations)
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant.id
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "hearth", "hearth")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = HearthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.tenant_id(), DEFAULT_TENANT_ID);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.toml");
        std::fs::write(
            &path,
            r#"
            [database]
            path = "/tmp/bakery.db"
            max_connections = 3

            [tenant]
            id = "bakery-7"
            "#,
        )
        .unwrap();

        let config = HearthConfig::load(Some(path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/bakery.db"));
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hearth.toml");

        let mut config = HearthConfig::default();
        config.logging.filter = "debug".into();
        config.save(Some(path.clone())).unwrap();

        let loaded = HearthConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.logging.filter, "debug");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("HEARTH_DATABASE_PATH", "/data/h.db"),
            ("HEARTH_MAX_CONNECTIONS", "not-a-number"),
            ("HEARTH_TENANT_ID", "t-9"),
        ]
        .into_iter()
        .collect();

        let mut config = HearthConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/h.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.tenant_id(), "t-9");
    }

    #[test]
    fn test_invalid_values() {
        let mut config = HearthConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = HearthConfig::default();
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_db_config_conversion() {
        let config = HearthConfig::default();
        let db = config.db_config();
        assert_eq!(db.max_connections, 5);
        assert_eq!(db.connect_timeout, Duration::from_secs(30));
        assert!(db.run_migrations);
    }
}
