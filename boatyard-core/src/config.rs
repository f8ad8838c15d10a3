//! Configuration management for Boatyard
//!
//! Settings live in a TOML file. A missing file is created with defaults;
//! a present file is parsed and validated before use.

use crate::cache_aside::DEFAULT_QUERY_TTL_SECS;
use crate::ratelimit::RateLimitConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Boatyard server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatyardConfig {
    /// HTTP listener settings
    pub server: ServerSettings,
    /// Cache settings
    pub cache: CacheSettings,
    /// Rate limiting settings
    pub rate_limit: RateLimitSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Server port
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of cached query results in seconds
    pub query_ttl_secs: u64,
    /// Expiry sweep interval in milliseconds
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Rate limiting enabled
    pub enabled: bool,
    /// Requests per window
    pub max_requests: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: LogLevel,
    /// Log format
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            query_ttl_secs: DEFAULT_QUERY_TTL_SECS,
            sweep_interval_ms: 1000,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let limits = RateLimitConfig::default();
        Self {
            enabled: true,
            max_requests: limits.max_requests,
            window_secs: limits.window_secs,
        }
    }
}

impl RateLimitSettings {
    pub fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.max_requests,
            window_secs: self.window_secs,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    /// Current configuration
    config: BoatyardConfig,
    /// Configuration file path
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load `config_path`, writing the defaults there first if it does not exist
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            let default_config = BoatyardConfig::default();
            Self::save_config(&config_path, &default_config)?;
            info!("Wrote default configuration to {}", config_path.display());
            default_config
        };

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Get current configuration
    pub fn config(&self) -> &BoatyardConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Apply an override (e.g. from the command line) and re-validate
    pub fn update<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut BoatyardConfig),
    {
        let mut candidate = self.config.clone();
        updater(&mut candidate);
        Self::validate_config(&candidate)?;
        self.config = candidate;
        Ok(())
    }

    /// Validate configuration
    pub fn validate_config(config: &BoatyardConfig) -> Result<()> {
        if config.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if config.server.host.trim().is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if config.cache.query_ttl_secs == 0 {
            return Err(anyhow::anyhow!("Cache query TTL cannot be 0"));
        }

        if config.cache.sweep_interval_ms == 0 {
            return Err(anyhow::anyhow!("Cache sweep interval cannot be 0"));
        }

        if config.rate_limit.max_requests == 0 {
            return Err(anyhow::anyhow!("Rate limit max requests cannot be 0"));
        }

        if config.rate_limit.window_secs == 0 {
            return Err(anyhow::anyhow!("Rate limit window cannot be 0"));
        }

        Ok(())
    }

    /// Load configuration from file
    fn load_config(path: &Path) -> Result<BoatyardConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BoatyardConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Save configuration to file
    fn save_config(path: &Path, config: &BoatyardConfig) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(config)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = BoatyardConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.query_ttl_secs, 300);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = BoatyardConfig::default();

        // Valid config should pass
        assert!(ConfigManager::validate_config(&config).is_ok());

        // Invalid port should fail
        config.server.port = 0;
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = BoatyardConfig::default();
        config.rate_limit.window_secs = 0;
        assert!(ConfigManager::validate_config(&config).is_err());
    }

    #[test]
    fn test_config_manager_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("boatyard.toml");

        let manager = ConfigManager::new(config_path.clone()).unwrap();

        // Config file should be created
        assert!(config_path.exists());
        assert_eq!(manager.config(), &BoatyardConfig::default());

        // And load back identically
        let reloaded = ConfigManager::new(config_path).unwrap();
        assert_eq!(reloaded.config(), manager.config());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("boatyard.toml");
        std::fs::write(
            &config_path,
            "[rate_limit]\nmax_requests = 10\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let manager = ConfigManager::new(config_path).unwrap();
        let config = manager.config();
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("boatyard.toml");
        std::fs::write(&config_path, "[cache]\nquery_ttl_secs = 0\n").unwrap();

        assert!(ConfigManager::new(config_path).is_err());
    }

    #[test]
    fn test_update_rejects_invalid_override() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(temp_dir.path().join("boatyard.toml")).unwrap();

        manager.update(|c| c.server.port = 8080).unwrap();
        assert_eq!(manager.config().server.port, 8080);

        assert!(manager.update(|c| c.server.port = 0).is_err());
        assert_eq!(manager.config().server.port, 8080);
    }
}
