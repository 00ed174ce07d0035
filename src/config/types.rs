//! Configuration types for the calculation engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every type has a
//! `Default` carrying the built-in rates, so the engines work without any
//! files on disk.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Default standard working hours per month used to derive the overtime rate.
pub const DEFAULT_STANDARD_MONTHLY_HOURS: Decimal = Decimal::from_parts(160, 0, 0, false, 0);

/// Default overtime multiplier (time and a half).
pub const DEFAULT_OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Default employer benefits rate (12% of basic salary).
pub const DEFAULT_BENEFITS_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// Default social security rate (4.5% of basic salary).
pub const DEFAULT_SOCIAL_SECURITY_RATE: Decimal = Decimal::from_parts(45, 0, 0, false, 3);

/// Default health insurance rate (1.5% of basic salary).
pub const DEFAULT_HEALTH_INSURANCE_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

/// Default flat tax rate of the legacy payroll formula (20%).
pub const DEFAULT_FLAT_TAX_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Default benefits rate of the legacy payroll formula (10%).
pub const DEFAULT_FLAT_BENEFITS_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Rates used by the progressive payroll formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRates {
    /// Working hours per month; basic salary divided by this gives the hourly rate.
    pub standard_monthly_hours: Decimal,
    /// Multiplier applied to the hourly rate for overtime hours.
    pub overtime_multiplier: Decimal,
    /// Employer benefits as a fraction of basic salary.
    pub benefits_rate: Decimal,
    /// Social security as a fraction of basic salary.
    pub social_security_rate: Decimal,
    /// Health insurance as a fraction of basic salary.
    pub health_insurance_rate: Decimal,
}

impl Default for PayrollRates {
    fn default() -> Self {
        Self {
            standard_monthly_hours: DEFAULT_STANDARD_MONTHLY_HOURS,
            overtime_multiplier: DEFAULT_OVERTIME_MULTIPLIER,
            benefits_rate: DEFAULT_BENEFITS_RATE,
            social_security_rate: DEFAULT_SOCIAL_SECURITY_RATE,
            health_insurance_rate: DEFAULT_HEALTH_INSURANCE_RATE,
        }
    }
}

/// Rates used by the legacy flat-rate payroll formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRatePayrollRates {
    /// Tax as a fraction of taxable income.
    pub tax_rate: Decimal,
    /// Employer benefits as a fraction of basic salary.
    pub benefits_rate: Decimal,
}

impl Default for FlatRatePayrollRates {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_FLAT_TAX_RATE,
            benefits_rate: DEFAULT_FLAT_BENEFITS_RATE,
        }
    }
}

/// Payroll configuration file structure (`payroll.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollConfig {
    /// Rates for the progressive formula.
    pub progressive: PayrollRates,
    /// Rates for the legacy flat-rate formula.
    #[serde(default)]
    pub flat_rate: FlatRatePayrollRates,
}

/// One band of a progressive tax schedule.
///
/// Income in `[lower, upper)` is taxed at `rate`. The last band has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the band (inclusive).
    pub lower: Decimal,
    /// Upper bound of the band, or `None` for the top band.
    #[serde(default)]
    pub upper: Option<Decimal>,
    /// Marginal rate applied to income within the band.
    pub rate: Decimal,
}

/// A progressive tax schedule (`tax_brackets.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSchedule {
    /// Bands ordered by lower bound.
    pub brackets: Vec<TaxBracket>,
}

impl Default for TaxSchedule {
    /// 10% up to 2500, 15% up to 5000, 25% above.
    fn default() -> Self {
        Self {
            brackets: vec![
                TaxBracket {
                    lower: Decimal::ZERO,
                    upper: Some(Decimal::new(2500, 0)),
                    rate: Decimal::new(10, 2),
                },
                TaxBracket {
                    lower: Decimal::new(2500, 0),
                    upper: Some(Decimal::new(5000, 0)),
                    rate: Decimal::new(15, 2),
                },
                TaxBracket {
                    lower: Decimal::new(5000, 0),
                    upper: None,
                    rate: Decimal::new(25, 2),
                },
            ],
        }
    }
}

impl TaxSchedule {
    /// Checks that the bands start at zero, are contiguous and ascending,
    /// that only the last band is unbounded, and that every rate is in `[0, 1]`.
    pub fn validate(&self) -> EngineResult<()> {
        let first = self.brackets.first().ok_or_else(|| EngineError::InvalidConfig {
            message: "tax schedule has no brackets".to_string(),
        })?;

        if !first.lower.is_zero() {
            return Err(EngineError::InvalidConfig {
                message: format!("first tax bracket must start at 0, found {}", first.lower),
            });
        }

        let last_index = self.brackets.len() - 1;
        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "tax bracket {} has rate {} outside [0, 1]",
                        index, bracket.rate
                    ),
                });
            }

            match bracket.upper {
                Some(upper) if upper <= bracket.lower => {
                    return Err(EngineError::InvalidConfig {
                        message: format!(
                            "tax bracket {} upper bound {} is not above lower bound {}",
                            index, upper, bracket.lower
                        ),
                    });
                }
                None if index != last_index => {
                    return Err(EngineError::InvalidConfig {
                        message: format!("only the last tax bracket may be unbounded (bracket {})", index),
                    });
                }
                _ => {}
            }

            if let Some(next) = self.brackets.get(index + 1) {
                if bracket.upper != Some(next.lower) {
                    return Err(EngineError::InvalidConfig {
                        message: format!(
                            "tax brackets {} and {} are not contiguous",
                            index,
                            index + 1
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Demand forecasting settings (`forecast.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Number of most recent points averaged for the recent level.
    pub recent_window: usize,
    /// Number of earliest points averaged for the trend baseline.
    pub early_window: usize,
    /// Minimum history length before a trend factor is computed.
    pub min_points_for_trend: usize,
    /// Minimum history length before a confidence score is computed.
    pub min_points_for_confidence: usize,
    /// Confidence (0-100) under which a forecast is flagged as low confidence.
    pub low_confidence_threshold: Decimal,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            recent_window: 3,
            early_window: 3,
            min_points_for_trend: 2,
            min_points_for_confidence: 2,
            low_confidence_threshold: Decimal::new(50, 0),
        }
    }
}

impl ForecastSettings {
    /// Checks that the averaging windows are non-empty and the threshold is a percentage.
    pub fn validate(&self) -> EngineResult<()> {
        if self.recent_window == 0 || self.early_window == 0 {
            return Err(EngineError::InvalidConfig {
                message: "forecast windows must be at least 1".to_string(),
            });
        }
        if self.low_confidence_threshold < Decimal::ZERO
            || self.low_confidence_threshold > Decimal::ONE_HUNDRED
        {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "low_confidence_threshold {} outside [0, 100]",
                    self.low_confidence_threshold
                ),
            });
        }
        Ok(())
    }
}

/// The complete engine configuration.
///
/// Aggregates payroll rates, the tax schedule and the forecast settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    payroll: PayrollConfig,
    tax: TaxSchedule,
    forecast: ForecastSettings,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(payroll: PayrollConfig, tax: TaxSchedule, forecast: ForecastSettings) -> Self {
        let mut sorted_tax = tax;
        sorted_tax.brackets.sort_by(|a, b| a.lower.cmp(&b.lower));
        Self {
            payroll,
            tax: sorted_tax,
            forecast,
        }
    }

    /// Returns the progressive payroll rates.
    pub fn payroll_rates(&self) -> &PayrollRates {
        &self.payroll.progressive
    }

    /// Returns the legacy flat-rate payroll rates.
    pub fn flat_rate_payroll(&self) -> &FlatRatePayrollRates {
        &self.payroll.flat_rate
    }

    /// Returns the tax schedule.
    pub fn tax_schedule(&self) -> &TaxSchedule {
        &self.tax
    }

    /// Returns the forecast settings.
    pub fn forecast_settings(&self) -> &ForecastSettings {
        &self.forecast
    }

    /// Validates every section.
    pub fn validate(&self) -> EngineResult<()> {
        let rates = self.payroll_rates();
        if rates.standard_monthly_hours <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                message: "standard_monthly_hours must be greater than zero".to_string(),
            });
        }
        self.tax.validate()?;
        self.forecast.validate()
    }
}
