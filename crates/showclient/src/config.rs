//! Configuration file support for the show client
//!
//! Loads and validates settings from TOML files.
//! Default location: /etc/sonic/show_client.conf

use crate::db::DbId;
use crate::error::{Result, ShowError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/show_client.conf";

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Redis host
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis database number for APPL_DB
    #[serde(default = "default_appl_db_number")]
    pub appl_db_number: u32,

    /// Redis database number for COUNTERS_DB
    #[serde(default = "default_counters_db_number")]
    pub counters_db_number: u32,

    /// Redis database number for CONFIG_DB
    #[serde(default = "default_config_db_number")]
    pub config_db_number: u32,

    /// Redis database number for STATE_DB
    #[serde(default = "default_state_db_number")]
    pub state_db_number: u32,
}

impl DatabaseConfig {
    /// Database number configured for `db`
    pub fn db_number(&self, db: DbId) -> u32 {
        match db {
            DbId::ApplDb => self.appl_db_number,
            DbId::CountersDb => self.counters_db_number,
            DbId::ConfigDb => self.config_db_number,
            DbId::StateDb => self.state_db_number,
        }
    }
}

/// Show command limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowConfig {
    /// Largest accepted counters sampling period in seconds
    #[serde(default = "default_max_period")]
    pub max_period_secs: u64,

    /// Overall request deadline in seconds (0 disables it)
    #[serde(default)]
    pub query_timeout_secs: u64,
}

/// Host filesystem locations of port configuration files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the device-level port_config files
    #[serde(default = "default_etc_dir")]
    pub etc_dir: String,

    /// Root of the per-platform device directories
    #[serde(default = "default_device_dir")]
    pub device_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete show client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowClientConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub show: ShowConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_appl_db_number() -> u32 {
    DbId::ApplDb.id()
}

fn default_counters_db_number() -> u32 {
    DbId::CountersDb.id()
}

fn default_config_db_number() -> u32 {
    DbId::ConfigDb.id()
}

fn default_state_db_number() -> u32 {
    DbId::StateDb.id()
}

fn default_max_period() -> u64 {
    300
}

fn default_etc_dir() -> String {
    "/etc/sonic".to_string()
}

fn default_device_dir() -> String {
    "/usr/share/sonic/device".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            appl_db_number: default_appl_db_number(),
            counters_db_number: default_counters_db_number(),
            config_db_number: default_config_db_number(),
            state_db_number: default_state_db_number(),
        }
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            max_period_secs: default_max_period(),
            query_timeout_secs: 0,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            etc_dir: default_etc_dir(),
            device_dir: default_device_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ShowClientConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| {
                    ShowError::Configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ShowError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Request deadline, if one is configured
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.show.query_timeout_secs > 0).then(|| Duration::from_secs(self.show.query_timeout_secs))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.redis_port == 0 {
            return Err(ShowError::Configuration(
                "redis_port must be > 0".to_string(),
            ));
        }

        if self.show.max_period_secs == 0 {
            return Err(ShowError::Configuration(
                "max_period_secs must be > 0".to_string(),
            ));
        }

        if self.paths.etc_dir.is_empty() || self.paths.device_dir.is_empty() {
            return Err(ShowError::Configuration(
                "etc_dir and device_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ShowClientConfig::default();
        assert_eq!(config.database.redis_host, "127.0.0.1");
        assert_eq!(config.database.redis_port, 6379);
        assert_eq!(config.database.config_db_number, 4);
        assert_eq!(config.database.counters_db_number, 2);
        assert_eq!(config.show.max_period_secs, 300);
        assert_eq!(config.paths.etc_dir, "/etc/sonic");
        assert!(config.query_timeout().is_none());
    }

    #[test]
    fn test_db_number_lookup() {
        let config = DatabaseConfig::default();
        assert_eq!(config.db_number(DbId::ApplDb), 0);
        assert_eq!(config.db_number(DbId::StateDb), 6);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(ShowClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_values() {
        let mut config = ShowClientConfig::default();
        config.database.redis_port = 0;
        assert!(config.validate().is_err());

        let mut config = ShowClientConfig::default();
        config.show.max_period_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ShowClientConfig::default();
        config.paths.device_dir.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[database]
redis_host = "10.0.0.1"

[show]
max_period_secs = 60
query_timeout_secs = 30
"#;
        let config: ShowClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.redis_host, "10.0.0.1");
        assert_eq!(config.database.redis_port, 6379);
        assert_eq!(config.show.max_period_secs, 60);
        assert_eq!(config.query_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.paths.device_dir, "/usr/share/sonic/device");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[paths]\netc_dir = \"/tmp/sonic\"").unwrap();
        let config = ShowClientConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.paths.etc_dir, "/tmp/sonic");
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[show\nmax_period_secs = ").unwrap();
        assert!(matches!(
            ShowClientConfig::load_or_default(file.path()),
            Err(ShowError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = ShowClientConfig::load_or_default("/nonexistent/show_client.conf").unwrap();
        assert_eq!(config.show.max_period_secs, 300);
    }
}
