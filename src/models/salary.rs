//! Salary input and payroll breakdown models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The raw salary figures for one payroll run.
///
/// # Example
///
/// ```
/// use bizcalc_engine::models::SalaryInput;
/// use rust_decimal::Decimal;
///
/// let salary = SalaryInput {
///     basic_salary: Decimal::new(4000, 0),
///     overtime_hours: Decimal::new(10, 0),
///     bonuses: Decimal::ZERO,
/// };
/// assert!(salary.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryInput {
    /// Monthly basic salary.
    pub basic_salary: Decimal,
    /// Overtime hours worked in the month.
    #[serde(default)]
    pub overtime_hours: Decimal,
    /// One-off bonuses paid in the month.
    #[serde(default)]
    pub bonuses: Decimal,
}

impl SalaryInput {
    /// Checks that every field is non-negative.
    ///
    /// Returns [`EngineError::InvalidInput`] naming the first negative field.
    pub fn validate(&self) -> EngineResult<()> {
        let fields = [
            ("basic_salary", self.basic_salary),
            ("overtime_hours", self.overtime_hours),
            ("bonuses", self.bonuses),
        ];

        for (field, value) in fields {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(EngineError::invalid_input(
                    field,
                    format!("must not be negative (got {})", value),
                ));
            }
        }

        Ok(())
    }
}

/// Which payroll formula produced a breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollVariant {
    /// Progressive tax brackets with statutory deductions.
    #[default]
    Progressive,
    /// Legacy flat-rate tax without statutory deductions.
    FlatRate,
}

/// The computed components of a payslip.
///
/// Derived amounts are rounded to cents, and the totals are derived from
/// the rounded components so that
/// `net_salary == taxable_income + benefits - deductions` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBreakdown {
    /// The formula used.
    pub variant: PayrollVariant,
    /// Monthly basic salary.
    pub basic_salary: Decimal,
    /// Hourly rate used for overtime, before the overtime multiplier.
    /// Kept at full precision.
    pub overtime_rate: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Bonuses included in taxable income.
    pub bonuses: Decimal,
    /// Employer-funded benefits (not taxed).
    pub benefits: Decimal,
    /// Basic salary plus overtime pay plus bonuses.
    pub taxable_income: Decimal,
    /// Income tax.
    pub taxes: Decimal,
    /// Social security contribution.
    pub social_security: Decimal,
    /// Health insurance contribution.
    pub health_insurance: Decimal,
    /// Taxes plus social security plus health insurance.
    pub deductions: Decimal,
    /// Take-home pay.
    pub net_salary: Decimal,
}

impl PayrollBreakdown {
    /// Returns the gross amount before deductions (taxable income plus benefits).
    pub fn gross_pay(&self) -> Decimal {
        self.taxable_income + self.benefits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn salary(basic: &str, overtime: &str, bonuses: &str) -> SalaryInput {
        SalaryInput {
            basic_salary: dec(basic),
            overtime_hours: dec(overtime),
            bonuses: dec(bonuses),
        }
    }

    #[test]
    fn test_validate_accepts_zero_values() {
        assert!(salary("0", "0", "0").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_basic_salary() {
        let result = salary("-1", "0", "0").validate();
        match result {
            Err(EngineError::InvalidInput { field, .. }) => assert_eq!(field, "basic_salary"),
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_validate_rejects_negative_overtime_hours() {
        let result = salary("4000", "-2.5", "0").validate();
        match result {
            Err(EngineError::InvalidInput { field, message }) => {
                assert_eq!(field, "overtime_hours");
                assert!(message.contains("-2.5"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_validate_rejects_negative_bonuses() {
        let result = salary("4000", "0", "-100").validate();
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { ref field, .. }) if field == "bonuses"
        ));
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let input: SalaryInput = serde_json::from_str(r#"{"basic_salary": "3200.50"}"#).unwrap();
        assert_eq!(input.basic_salary, dec("3200.50"));
        assert_eq!(input.overtime_hours, Decimal::ZERO);
        assert_eq!(input.bonuses, Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_numeric_amounts() {
        let input: SalaryInput =
            serde_json::from_str(r#"{"basic_salary": 4000, "overtime_hours": 10, "bonuses": 250.5}"#)
                .unwrap();
        assert_eq!(input.basic_salary, dec("4000"));
        assert_eq!(input.bonuses, dec("250.5"));
    }

    #[test]
    fn test_payroll_variant_serialization() {
        assert_eq!(
            serde_json::to_string(&PayrollVariant::Progressive).unwrap(),
            "\"progressive\""
        );
        assert_eq!(
            serde_json::to_string(&PayrollVariant::FlatRate).unwrap(),
            "\"flat_rate\""
        );
        assert_eq!(PayrollVariant::default(), PayrollVariant::Progressive);
    }
}
