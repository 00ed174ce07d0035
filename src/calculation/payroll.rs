//! Payroll component calculation.
//!
//! Combines basic salary, overtime, bonuses, benefits and tax into a net
//! salary breakdown. Two formulas exist: the canonical progressive formula
//! ([`calculate_payroll_components`]) and a legacy flat-rate formula
//! ([`calculate_flat_rate_payroll`]) that gives materially different
//! results and is only used when a caller asks for it by name.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, PayrollBreakdown, PayrollVariant, SalaryInput};

use super::rounding::round_money;
use super::tax::calculate_tax_with_audit;

/// The result of a payroll calculation, including the audit trail.
#[derive(Debug, Clone)]
pub struct PayrollCalculation {
    /// The computed payslip components.
    pub breakdown: PayrollBreakdown,
    /// One audit step per rule applied, in order.
    pub audit_steps: Vec<AuditStep>,
    /// Conditions worth a second look (e.g. a negative net salary).
    pub warnings: Vec<AuditWarning>,
}

/// Overtime pay shared by both formulas.
struct OvertimeComponents {
    rate: Decimal,
    pay: Decimal,
}

fn calculate_overtime(
    salary: &SalaryInput,
    standard_monthly_hours: Decimal,
    multiplier: Decimal,
) -> EngineResult<OvertimeComponents> {
    let rate = salary
        .basic_salary
        .checked_div(standard_monthly_hours)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!(
                "cannot derive overtime rate from {} standard monthly hours",
                standard_monthly_hours
            ),
        })?;

    let pay = salary
        .overtime_hours
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(multiplier))
        .ok_or_else(|| EngineError::overflow("overtime pay"))?;

    Ok(OvertimeComponents {
        rate,
        pay: round_money(pay),
    })
}

fn checked_fraction(base: Decimal, rate: Decimal, what: &str) -> EngineResult<Decimal> {
    base.checked_mul(rate)
        .map(round_money)
        .ok_or_else(|| EngineError::overflow(what))
}

fn checked_sum(amounts: &[Decimal], what: &str) -> EngineResult<Decimal> {
    amounts
        .iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(*amount))
        .ok_or_else(|| EngineError::overflow(what))
}

/// `taxable_income + benefits - deductions`.
fn checked_net(taxable_income: Decimal, benefits: Decimal, deductions: Decimal) -> EngineResult<Decimal> {
    taxable_income
        .checked_add(benefits)
        .and_then(|gross| gross.checked_sub(deductions))
        .ok_or_else(|| EngineError::overflow("net salary"))
}

fn rate_step(
    step_number: u32,
    rule_id: &str,
    rule_name: &str,
    base_name: &str,
    base: Decimal,
    rate: Decimal,
    amount: Decimal,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        input: serde_json::json!({
            base_name: base.normalize().to_string(),
            "rate": rate.normalize().to_string()
        }),
        output: serde_json::json!({
            rule_id: amount.normalize().to_string()
        }),
        reasoning: format!(
            "${} x {} = ${}",
            base.normalize(),
            rate.normalize(),
            amount.normalize()
        ),
    }
}

fn overtime_step(
    step_number: u32,
    salary: &SalaryInput,
    standard_monthly_hours: Decimal,
    multiplier: Decimal,
    overtime: &OvertimeComponents,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "overtime".to_string(),
        rule_name: "Overtime Pay".to_string(),
        input: serde_json::json!({
            "basic_salary": salary.basic_salary.normalize().to_string(),
            "standard_monthly_hours": standard_monthly_hours.normalize().to_string(),
            "overtime_hours": salary.overtime_hours.normalize().to_string(),
            "multiplier": multiplier.normalize().to_string()
        }),
        output: serde_json::json!({
            "overtime_rate": overtime.rate.normalize().to_string(),
            "overtime_pay": overtime.pay.normalize().to_string()
        }),
        reasoning: format!(
            "${} / {}h = ${}/h; {}h x ${}/h x {} = ${}",
            salary.basic_salary.normalize(),
            standard_monthly_hours.normalize(),
            overtime.rate.normalize(),
            salary.overtime_hours.normalize(),
            overtime.rate.normalize(),
            multiplier.normalize(),
            overtime.pay.normalize()
        ),
    }
}

fn net_salary_step(step_number: u32, breakdown: &PayrollBreakdown) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "net_salary".to_string(),
        rule_name: "Net Salary".to_string(),
        input: serde_json::json!({
            "taxable_income": breakdown.taxable_income.normalize().to_string(),
            "benefits": breakdown.benefits.normalize().to_string(),
            "deductions": breakdown.deductions.normalize().to_string()
        }),
        output: serde_json::json!({
            "net_salary": breakdown.net_salary.normalize().to_string()
        }),
        reasoning: format!(
            "${} + ${} - ${} = ${}",
            breakdown.taxable_income.normalize(),
            breakdown.benefits.normalize(),
            breakdown.deductions.normalize(),
            breakdown.net_salary.normalize()
        ),
    }
}

fn negative_net_warning(breakdown: &PayrollBreakdown) -> Option<AuditWarning> {
    if breakdown.net_salary < Decimal::ZERO {
        Some(AuditWarning {
            code: "negative_net_salary".to_string(),
            message: format!(
                "Deductions of ${} exceed gross pay of ${}",
                breakdown.deductions.normalize(),
                breakdown.gross_pay().normalize()
            ),
            severity: "high".to_string(),
        })
    } else {
        None
    }
}

/// Calculates a payslip using progressive tax brackets.
///
/// Steps, in order:
/// 1. `overtime_rate = basic_salary / standard_monthly_hours`
/// 2. `overtime_pay = overtime_hours × overtime_rate × overtime_multiplier`
/// 3. `benefits = basic_salary × benefits_rate`
/// 4. `taxable_income = basic_salary + overtime_pay + bonuses`
/// 5. `taxes = calculate_tax(taxable_income)`
/// 6. `social_security` and `health_insurance` as fractions of basic salary
/// 7. `deductions = taxes + social_security + health_insurance`
/// 8. `net_salary = taxable_income + benefits − deductions`
///
/// Audit steps are numbered from `step_number`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] if any salary field is negative and
/// [`EngineError::CalculationError`] if an amount overflows.
///
/// # Examples
///
/// ```
/// use bizcalc_engine::calculation::calculate_payroll_components;
/// use bizcalc_engine::config::EngineConfig;
/// use bizcalc_engine::models::SalaryInput;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let salary = SalaryInput {
///     basic_salary: Decimal::new(4000, 0),
///     overtime_hours: Decimal::new(10, 0),
///     bonuses: Decimal::ZERO,
/// };
///
/// let result = calculate_payroll_components(&salary, &EngineConfig::default(), 1).unwrap();
/// assert_eq!(result.breakdown.net_salary, Decimal::from_str("4083.75").unwrap());
/// ```
pub fn calculate_payroll_components(
    salary: &SalaryInput,
    config: &EngineConfig,
    step_number: u32,
) -> EngineResult<PayrollCalculation> {
    salary.validate()?;
    let rates = config.payroll_rates();
    let mut step = step_number;
    let mut audit_steps = Vec::with_capacity(6);

    let overtime = calculate_overtime(
        salary,
        rates.standard_monthly_hours,
        rates.overtime_multiplier,
    )?;
    audit_steps.push(overtime_step(
        step,
        salary,
        rates.standard_monthly_hours,
        rates.overtime_multiplier,
        &overtime,
    ));
    step += 1;

    let benefits = checked_fraction(salary.basic_salary, rates.benefits_rate, "benefits")?;
    audit_steps.push(rate_step(
        step,
        "benefits",
        "Employer Benefits",
        "basic_salary",
        salary.basic_salary,
        rates.benefits_rate,
        benefits,
    ));
    step += 1;

    let taxable_income = checked_sum(
        &[salary.basic_salary, overtime.pay, salary.bonuses],
        "taxable income",
    )?;

    let tax_result = calculate_tax_with_audit(taxable_income, config.tax_schedule(), step);
    let taxes = tax_result.tax;
    audit_steps.push(tax_result.audit_step);
    step += 1;

    let social_security = checked_fraction(
        salary.basic_salary,
        rates.social_security_rate,
        "social security",
    )?;
    audit_steps.push(rate_step(
        step,
        "social_security",
        "Social Security Contribution",
        "basic_salary",
        salary.basic_salary,
        rates.social_security_rate,
        social_security,
    ));
    step += 1;

    let health_insurance = checked_fraction(
        salary.basic_salary,
        rates.health_insurance_rate,
        "health insurance",
    )?;
    audit_steps.push(rate_step(
        step,
        "health_insurance",
        "Health Insurance Contribution",
        "basic_salary",
        salary.basic_salary,
        rates.health_insurance_rate,
        health_insurance,
    ));
    step += 1;

    let deductions = checked_sum(&[taxes, social_security, health_insurance], "deductions")?;
    let net_salary = checked_net(taxable_income, benefits, deductions)?;

    let breakdown = PayrollBreakdown {
        variant: PayrollVariant::Progressive,
        basic_salary: salary.basic_salary,
        overtime_rate: overtime.rate,
        overtime_pay: overtime.pay,
        bonuses: salary.bonuses,
        benefits,
        taxable_income,
        taxes,
        social_security,
        health_insurance,
        deductions,
        net_salary,
    };
    audit_steps.push(net_salary_step(step, &breakdown));

    let warnings: Vec<AuditWarning> = negative_net_warning(&breakdown).into_iter().collect();

    Ok(PayrollCalculation {
        breakdown,
        audit_steps,
        warnings,
    })
}

/// Calculates a payslip using the legacy flat-rate formula.
///
/// Overtime is computed as in the progressive formula, benefits use the
/// flat-rate benefits rate, tax is a flat fraction of taxable income and no
/// social security or health insurance is withheld. The two formulas
/// disagree for the same input; this one is kept for records produced by
/// older payroll screens and must be requested explicitly.
///
/// # Errors
///
/// Same as [`calculate_payroll_components`].
pub fn calculate_flat_rate_payroll(
    salary: &SalaryInput,
    config: &EngineConfig,
    step_number: u32,
) -> EngineResult<PayrollCalculation> {
    salary.validate()?;
    let rates = config.payroll_rates();
    let flat = config.flat_rate_payroll();
    let mut step = step_number;
    let mut audit_steps = Vec::with_capacity(4);

    warn!(
        basic_salary = %salary.basic_salary,
        "Using legacy flat-rate payroll formula"
    );

    let overtime = calculate_overtime(
        salary,
        rates.standard_monthly_hours,
        rates.overtime_multiplier,
    )?;
    audit_steps.push(overtime_step(
        step,
        salary,
        rates.standard_monthly_hours,
        rates.overtime_multiplier,
        &overtime,
    ));
    step += 1;

    let benefits = checked_fraction(salary.basic_salary, flat.benefits_rate, "benefits")?;
    audit_steps.push(rate_step(
        step,
        "benefits",
        "Employer Benefits (flat rate)",
        "basic_salary",
        salary.basic_salary,
        flat.benefits_rate,
        benefits,
    ));
    step += 1;

    let taxable_income = checked_sum(
        &[salary.basic_salary, overtime.pay, salary.bonuses],
        "taxable income",
    )?;

    let taxes = checked_fraction(taxable_income, flat.tax_rate, "flat tax")?;
    audit_steps.push(rate_step(
        step,
        "flat_tax",
        "Flat Income Tax",
        "taxable_income",
        taxable_income,
        flat.tax_rate,
        taxes,
    ));
    step += 1;

    let deductions = taxes;
    let net_salary = checked_net(taxable_income, benefits, deductions)?;

    let breakdown = PayrollBreakdown {
        variant: PayrollVariant::FlatRate,
        basic_salary: salary.basic_salary,
        overtime_rate: overtime.rate,
        overtime_pay: overtime.pay,
        bonuses: salary.bonuses,
        benefits,
        taxable_income,
        taxes,
        social_security: Decimal::ZERO,
        health_insurance: Decimal::ZERO,
        deductions,
        net_salary,
    };
    audit_steps.push(net_salary_step(step, &breakdown));

    let mut warnings = vec![AuditWarning {
        code: "legacy_flat_rate_formula".to_string(),
        message: "Calculated with the legacy flat-rate payroll formula".to_string(),
        severity: "medium".to_string(),
    }];
    warnings.extend(negative_net_warning(&breakdown));

    Ok(PayrollCalculation {
        breakdown,
        audit_steps,
        warnings,
    })
}

/// Calculates a payslip with the requested formula.
pub fn calculate_payroll(
    salary: &SalaryInput,
    variant: PayrollVariant,
    config: &EngineConfig,
    step_number: u32,
) -> EngineResult<PayrollCalculation> {
    match variant {
        PayrollVariant::Progressive => calculate_payroll_components(salary, config, step_number),
        PayrollVariant::FlatRate => calculate_flat_rate_payroll(salary, config, step_number),
    }
}
