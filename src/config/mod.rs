//! Configuration loading and management for the calculation engine.
//!
//! This module provides functionality to load payroll rates, the progressive
//! tax schedule and demand forecast settings from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use bizcalc_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! println!("Benefits rate: {}", loader.config().payroll_rates().benefits_rate);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, DEFAULT_CONFIG_DIR};
pub use types::{
    DEFAULT_BENEFITS_RATE, DEFAULT_FLAT_BENEFITS_RATE, DEFAULT_FLAT_TAX_RATE,
    DEFAULT_HEALTH_INSURANCE_RATE, DEFAULT_OVERTIME_MULTIPLIER, DEFAULT_SOCIAL_SECURITY_RATE,
    DEFAULT_STANDARD_MONTHLY_HOURS, EngineConfig, FlatRatePayrollRates, ForecastSettings,
    PayrollConfig, PayrollRates, TaxBracket, TaxSchedule,
};
