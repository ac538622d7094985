//! Configuration
//!
//! Provides configuration management with:
//! - Runtime defaults
//! - Config file loading (optional, `basic` feature)
//! - Environment variable overrides
//! - Validation

use crate::cost::ProductSelection;
use crate::ingestion::DEFAULT_WINDOW_DAYS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
#[cfg(feature = "basic")]
use std::fs;

const LOG_FORMATS: [&str; 2] = ["pretty", "json"];
const LOG_OUTPUTS: [&str; 3] = ["console", "file", "both"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Input and log locations
    pub paths: PathsConfig,

    /// Report behaviour
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub diagnostic_dir: PathBuf,
    pub pricing_file: PathBuf,
    pub log_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub product_selection: ProductSelection,
    pub ingestion_window_days: usize,
    pub wide_columns: bool,
    pub json_pretty: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            diagnostic_dir: PathBuf::from("."),
            pricing_file: PathBuf::from("elastic_pricing.csv"),
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            product_selection: ProductSelection::FirstSeen,
            ingestion_window_days: DEFAULT_WINDOW_DAYS,
            wide_columns: false,
            json_pretty: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            paths: PathsConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file or the default locations, then the
    /// environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default_locations()?,
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_default_locations() -> Result<Self> {
        let config_paths = [
            PathBuf::from("es-cost-report.toml"),
            PathBuf::from(".es-cost-report.toml"),
            dirs::config_dir()
                .map(|d| d.join("es-cost-report").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                return Self::load_from_file(path);
            }
        }
        Ok(Config::default())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "basic")]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    #[cfg(not(feature = "basic"))]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        anyhow::bail!(
            "Config file {} given, but file support is disabled (enable the `basic` feature)",
            path.display()
        )
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Path overrides
        if let Ok(val) = env::var("ES_COST_DIAGNOSTIC_DIR") {
            self.paths.diagnostic_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("ES_COST_PRICING_FILE") {
            self.paths.pricing_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("ES_COST_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        // Report overrides
        if let Ok(val) = env::var("ES_COST_WINDOW_DAYS") {
            self.report.ingestion_window_days =
                val.parse().context("Invalid ES_COST_WINDOW_DAYS")?;
        }
        if let Ok(val) = env::var("ES_COST_PRODUCT_SELECTION") {
            self.report.product_selection =
                val.parse().context("Invalid ES_COST_PRODUCT_SELECTION")?;
        }
        if let Ok(val) = env::var("ES_COST_WIDE") {
            self.report.wide_columns = val.parse().context("Invalid ES_COST_WIDE")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.report.ingestion_window_days == 0 {
            return Err(anyhow::anyhow!("Ingestion window must be at least one day"));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log format '{}', expected one of {:?}",
                self.logging.format,
                LOG_FORMATS
            ));
        }

        if !LOG_OUTPUTS.contains(&self.logging.output.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log output '{}', expected one of {:?}",
                self.logging.output,
                LOG_OUTPUTS
            ));
        }

        Ok(())
    }

    /// Save current configuration to file
    #[cfg(feature = "basic")]
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
