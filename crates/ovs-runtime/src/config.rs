//! Runtime configuration
//!
//! Handles loading runtime settings from TOML files, environment
//! variables, and default values, merged with Figment.

use crate::error_ext::ErrorContext;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use ovs_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "OVS";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "overseer.toml";

/// Top-level runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory for service data files
    pub data_dir: PathBuf,

    /// Directory for service configuration resources
    pub config_dir: PathBuf,

    /// Storage backend settings
    pub store: StoreConfig,

    /// Repository read-cache settings
    pub cache: CacheConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            config_dir: PathBuf::from("./config"),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Storage backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the registered store driver to use
    pub driver: String,

    /// Connection URI for networked backends
    pub uri: Option<String>,

    /// Base directory for file-backed backends
    pub path: Option<PathBuf>,

    /// Key namespace for shared backends
    pub namespace: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: "file".to_string(),
            uri: None,
            path: None,
            namespace: None,
        }
    }
}

impl StoreConfig {
    /// Build the connection descriptor handed to the driver registry
    pub fn to_driver_config(&self) -> ovs_domain::registry::DriverConfig {
        let mut config = ovs_domain::registry::DriverConfig::new(&self.driver);
        if let Some(uri) = &self.uri {
            config = config.with_uri(uri);
        }
        if let Some(path) = &self.path {
            config = config.with_path(path);
        }
        if let Some(namespace) = &self.namespace {
            config = config.with_namespace(namespace);
        }
        config
    }
}

/// Repository read-cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether repositories keep a read cache in front of the driver
    pub enabled: bool,

    /// Maximum number of cached payloads per repository
    pub capacity: u64,

    /// Time-to-live for cached payloads, in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 10_000,
            ttl_secs: 300,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, or error
    pub level: String,

    /// Emit JSON-formatted log lines instead of human-readable ones
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Configuration sources are merged in this order (later sources override earlier):
    /// 1. Default values from `RuntimeConfig::default()`
    /// 2. TOML configuration file (if exists)
    /// 3. Environment variables with prefix (e.g., `OVS_STORE_DRIVER`)
    pub fn load(&self) -> Result<RuntimeConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(RuntimeConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                info!("Configuration loaded from {}", config_path.display());
            } else {
                warn!("Configuration file not found: {}", config_path.display());
            }
        } else {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            if default_path.exists() {
                figment = figment.merge(Toml::file(&default_path));
                info!("Configuration loaded from {}", default_path.display());
            }
        }

        // Underscore-separated nesting, e.g. OVS_CACHE_TTL_SECS
        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("_"));

        let config: RuntimeConfig = figment
            .extract()
            .config_context("Failed to extract runtime configuration")?;

        validate_config(&config)?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &RuntimeConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).config_context("Failed to serialize config to TOML")?;
        std::fs::write(path.as_ref(), toml_string).io_context("Failed to write config file")?;
        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate runtime configuration values
fn validate_config(config: &RuntimeConfig) -> Result<()> {
    if config.store.driver.is_empty() {
        return Err(Error::configuration("Store driver name cannot be empty"));
    }
    if config.data_dir.as_os_str().is_empty() {
        return Err(Error::configuration("Data directory cannot be empty"));
    }
    if config.config_dir.as_os_str().is_empty() {
        return Err(Error::configuration("Config directory cannot be empty"));
    }
    if config.cache.enabled {
        if config.cache.capacity == 0 {
            return Err(Error::configuration(
                "Cache capacity cannot be 0 when cache is enabled",
            ));
        }
        if config.cache.ttl_secs == 0 {
            return Err(Error::configuration(
                "Cache TTL cannot be 0 when cache is enabled",
            ));
        }
    }
    crate::logging::parse_log_level(&config.logging.level)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_pass_validation() {
        let config = RuntimeConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_cache_ttl_rejected_when_enabled() {
        let mut config = RuntimeConfig::default();
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());

        config.cache.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_driver_rejected() {
        let mut config = RuntimeConfig::default();
        config.store.driver.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = RuntimeConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overseer.toml");
        std::fs::write(&path, "[store]\ndriver = \"memory\"\n").unwrap();

        let config = ConfigLoader::new().with_config_path(&path).load().unwrap();
        assert_eq!(config.store.driver, "memory");
        // Untouched sections keep their defaults
        assert_eq!(config.cache.capacity, 10_000);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::new()
            .with_config_path("/nonexistent/overseer.toml")
            .load()
            .unwrap();
        assert_eq!(config.store.driver, "file");
    }
}
