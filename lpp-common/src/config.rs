//! Configuration loading
//!
//! One TOML file configures both binaries. Every section and every key is
//! optional; missing values fall back to the built-in defaults below.
//!
//! # Config file resolution
//! 1. Command-line `--config` path (must exist)
//! 2. `LPP_CONFIG` environment variable (must exist)
//! 3. `./lpp.toml`
//! 4. `<user config dir>/lpp/lpp.toml`
//! 5. Built-in defaults
//!
//! Command-line flags of the individual binaries override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::BoostingParams;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "LPP_CONFIG";

/// Config file name looked up in the working directory and the config dir
pub const CONFIG_FILE_NAME: &str = "lpp.toml";

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory holding the trained artifact bundle
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Values used for request fields that are neither given nor extractable
    #[serde(default)]
    pub defaults: FeatureDefaults,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub cleaning: CleaningConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            defaults: FeatureDefaults::default(),
            training: TrainingConfig::default(),
            cleaning: CleaningConfig::default(),
        }
    }
}

/// HTTP listener of the inference service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 5000
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

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins if set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Fallback value for every optional inference request field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureDefaults {
    pub ram_gb: f64,
    pub storage_gb: f64,
    pub cpu: String,
    pub gpu: String,
    pub brand: String,
}

impl Default for FeatureDefaults {
    fn default() -> Self {
        Self {
            ram_gb: 16.0,
            storage_gb: 512.0,
            cpu: "i5".to_string(),
            gpu: "integrated".to_string(),
            brand: crate::features::OTHER_BRAND.to_string(),
        }
    }
}

/// Model fitting and evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed of the train/test shuffle
    pub seed: u64,
    /// Tag reported with every prediction
    pub model_version: String,
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            model_version: "gbm-v1".to_string(),
            boosting: BoostingParams::default(),
        }
    }
}

/// Raw listing cleaning thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Prices at or below this are scraping errors
    pub min_price: f64,
    /// Prices at or above this are dropped before the IQR fence
    pub max_price: f64,
    pub min_ram_gb: f64,
    pub max_ram_gb: f64,
    pub min_storage_gb: f64,
    pub max_storage_gb: f64,
    /// k in `[Q1 - k·IQR, Q3 + k·IQR]`
    pub iqr_multiplier: f64,
    /// Phrases removed from titles before duplicate detection
    pub junk_phrases: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_price: 1_000.0,
            max_price: 300_000.0,
            min_ram_gb: 2.0,
            max_ram_gb: 128.0,
            min_storage_gb: 64.0,
            max_storage_gb: 8192.0,
            iqr_multiplier: 1.5,
            junk_phrases: ["türkiye garantili", "free dos", "freedos", "windows 11", "windows 10"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.training.test_fraction) {
            return Err(Error::Config(format!(
                "training.test_fraction must be in [0, 1), got {}",
                self.training.test_fraction
            )));
        }
        self.training.boosting.validate()?;

        let cleaning = &self.cleaning;
        if cleaning.min_price >= cleaning.max_price {
            return Err(Error::Config("cleaning.min_price must be below max_price".to_string()));
        }
        if cleaning.min_ram_gb > cleaning.max_ram_gb
            || cleaning.min_storage_gb > cleaning.max_storage_gb
        {
            return Err(Error::Config("cleaning ranges must have min <= max".to_string()));
        }
        if !(cleaning.iqr_multiplier.is_finite() && cleaning.iqr_multiplier >= 0.0) {
            return Err(Error::Config("cleaning.iqr_multiplier must be >= 0".to_string()));
        }

        let defaults = &self.defaults;
        let sizes_valid = [defaults.ram_gb, defaults.storage_gb]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !sizes_valid {
            return Err(Error::Config(
                "defaults.ram_gb and defaults.storage_gb must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// The config file that applies, or `None` for built-in defaults
///
/// An explicitly named file (CLI or environment) must exist; the discovered
/// locations are optional.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        return Ok(Some(path.to_path_buf()));
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(value);
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file from {} not found: {}",
                CONFIG_ENV_VAR,
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    // Priority 3: Working directory
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    // Priority 4: User config directory
    Ok(dirs::config_dir()
        .map(|dir| dir.join("lpp").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists()))
}

/// A loaded configuration and the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// `None` when the built-in defaults are in use
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Report the config source; call once tracing is initialized
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => warn!("No {} found, using built-in defaults", CONFIG_FILE_NAME),
        }
    }
}

/// Resolve and load the configuration
///
/// Does not log, so binaries can read the log level from the result before
/// initializing tracing.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig> {
    let source = resolve_config_path(cli_path)?;
    let config = match &source {
        Some(path) => TomlConfig::from_file(path)?,
        None => TomlConfig::default(),
    };
    Ok(LoadedConfig { config, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.defaults.cpu, "i5");
        assert_eq!(config.training.boosting.n_estimators, 200);
    }

    #[test]
    fn test_partial_sections() {
        let config: TomlConfig = toml::from_str(
            r#"
            artifacts_dir = "/var/lib/lpp"

            [server]
            port = 8080

            [training]
            seed = 7

            [training.boosting]
            max_depth = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.artifacts_dir, PathBuf::from("/var/lib/lpp"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.training.boosting.max_depth, 3);
        assert_eq!(config.training.boosting.n_estimators, 200);
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let mut config = TomlConfig::default();
        config.training.test_fraction = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_price_bounds() {
        let mut config = TomlConfig::default();
        config.cleaning.min_price = 500_000.0;
        assert!(config.validate().is_err());
    }
}
