//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, ForecastSettings, PayrollConfig, TaxSchedule};

/// Directory the server loads configuration from when none is given.
pub const DEFAULT_CONFIG_DIR: &str = "./config/default";

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── payroll.yaml       # Payroll rates (progressive and legacy flat-rate)
/// ├── tax_brackets.yaml  # Progressive tax schedule
/// └── forecast.yaml      # Demand forecast windows and thresholds
/// ```
///
/// `forecast.yaml` is optional; built-in defaults apply when it is absent.
///
/// # Example
///
/// ```no_run
/// use bizcalc_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Brackets: {}", loader.config().tax_schedule().brackets.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `payroll.yaml` or `tax_brackets.yaml` is missing
    /// - Any file contains invalid YAML
    /// - The loaded values fail validation
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bizcalc_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), bizcalc_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let payroll = Self::load_yaml::<PayrollConfig>(&path.join("payroll.yaml"))?;
        let tax = Self::load_yaml::<TaxSchedule>(&path.join("tax_brackets.yaml"))?;

        let forecast_path = path.join("forecast.yaml");
        let forecast = if forecast_path.exists() {
            Self::load_yaml::<ForecastSettings>(&forecast_path)?
        } else {
            debug!(path = %forecast_path.display(), "No forecast.yaml, using defaults");
            ForecastSettings::default()
        };

        let config = EngineConfig::new(payroll, tax, forecast);
        config.validate()?;

        debug!(
            path = %path.display(),
            tax_brackets = config.tax_schedule().brackets.len(),
            "Loaded engine configuration"
        );

        Ok(Self { config })
    }

    /// Wraps an already-built configuration after validating it.
    pub fn from_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
