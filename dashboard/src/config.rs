//! Dashboard configuration.
//!
//! Settings come from three places, later ones winning:
//!
//! 1. [`DashboardConfig::default()`]: the bundled Nepal sources under `./data`
//! 2. an optional JSON file passed with `--config`
//! 3. the `CLIMATE_DATA_DIR` and `CLIMATE_MODEL_DIR` environment variables
//!    (a `.env` file is read by the binary before loading)

use climate_learning::TrainingConfig;
use climate_processing::{ConfigValidationError, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the registry data directory.
pub const DATA_DIR_ENV: &str = "CLIMATE_DATA_DIR";

/// Overrides the directory the trained model artifact lives in.
pub const MODEL_DIR_ENV: &str = "CLIMATE_MODEL_DIR";

/// Top-level settings of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sources to load and layers to harmonize.
    pub registry: RegistryConfig,

    /// Directory holding `trained_model.json`.
    /// Default: "."
    pub model_dir: PathBuf,

    /// Region name used in layer titles.
    /// Default: "Nepal"
    pub region: String,

    /// Training settings used when a command does not bring its own.
    pub training: TrainingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            model_dir: PathBuf::from("."),
            region: "Nepal".to_string(),
            training: TrainingConfig::default(),
        }
    }
}

/// Errors raised while reading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Region name must not be empty")]
    EmptyRegion,

    #[error("Model directory must not be empty")]
    EmptyModelDir,

    #[error("Invalid registry configuration: {0}")]
    Registry(#[from] ConfigValidationError),

    #[error("Invalid training configuration: {0}")]
    Training(String),
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Read the optional config file, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_overrides(
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var(MODEL_DIR_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let read_error = |reason: String| ConfigError::Read {
            path: path.display().to_string(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
        let config = serde_json::from_str(&text).map_err(|e| read_error(e.to_string()))?;
        debug!("Read configuration from {}", path.display());
        Ok(config)
    }

    /// Replace the data and model directories when a value is given.
    ///
    /// Blank values are ignored.
    pub fn with_overrides(mut self, data_dir: Option<String>, model_dir: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            debug!("Data directory overridden: {}", dir);
            self.registry.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = model_dir.filter(|d| !d.trim().is_empty()) {
            debug!("Model directory overridden: {}", dir);
            self.model_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if self.model_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyModelDir);
        }
        self.registry.validate()?;
        self.training
            .validate()
            .map_err(|e| ConfigError::Training(e.to_string()))?;
        Ok(())
    }
}

/// Builder for [`DashboardConfig`].
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    registry: Option<RegistryConfig>,
    model_dir: Option<PathBuf>,
    region: Option<String>,
    training: Option<TrainingConfig>,
}

impl DashboardConfigBuilder {
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn training(mut self, training: TrainingConfig) -> Self {
        self.training = Some(training);
        self
    }

    pub fn build(self) -> Result<DashboardConfig, ConfigError> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            registry: self.registry.unwrap_or(defaults.registry),
            model_dir: self.model_dir.unwrap_or(defaults.model_dir),
            region: self.region.unwrap_or(defaults.region),
            training: self.training.unwrap_or(defaults.training),
        };
        config.validate()?;
        Ok(config)
    }
}
