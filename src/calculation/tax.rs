//! Progressive income tax calculation.
//!
//! Each band of a [`TaxSchedule`] is taxed only on the portion of income
//! that falls inside it, so the tax owed is continuous across band edges.

use rust_decimal::Decimal;

use crate::config::TaxSchedule;
use crate::models::AuditStep;

use super::rounding::round_money;

/// The tax owed inside a single band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTax {
    /// Lower bound of the band.
    pub lower: Decimal,
    /// Upper bound of the band, `None` for the top band.
    pub upper: Option<Decimal>,
    /// Marginal rate of the band.
    pub rate: Decimal,
    /// Income that fell inside the band.
    pub taxed_amount: Decimal,
    /// Tax owed on that income (unrounded).
    pub tax: Decimal,
}

/// The result of a tax calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct TaxCalculationResult {
    /// Tax owed, rounded to cents.
    pub tax: Decimal,
    /// Per-band breakdown, only bands that received income.
    pub brackets: Vec<BracketTax>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Splits `taxable_income` across the schedule's bands.
fn split_into_brackets(taxable_income: Decimal, schedule: &TaxSchedule) -> Vec<BracketTax> {
    let income = taxable_income.max(Decimal::ZERO);

    schedule
        .brackets
        .iter()
        .take_while(|bracket| income > bracket.lower)
        .map(|bracket| {
            let ceiling = bracket.upper.map_or(income, |upper| income.min(upper));
            let taxed_amount = ceiling - bracket.lower;
            BracketTax {
                lower: bracket.lower,
                upper: bracket.upper,
                rate: bracket.rate,
                taxed_amount,
                tax: taxed_amount * bracket.rate,
            }
        })
        .collect()
}

/// Calculates progressive income tax.
///
/// With the default schedule:
/// - income ≤ 2500 → income × 0.10
/// - 2500 < income ≤ 5000 → 250 + (income − 2500) × 0.15
/// - income > 5000 → 625 + (income − 5000) × 0.25
///
/// Negative income is treated as zero. The result is rounded to cents.
///
/// # Examples
///
/// ```
/// use bizcalc_engine::calculation::calculate_tax;
/// use bizcalc_engine::config::TaxSchedule;
/// use rust_decimal::Decimal;
///
/// let schedule = TaxSchedule::default();
/// assert_eq!(calculate_tax(Decimal::new(2500, 0), &schedule), Decimal::new(250, 0));
/// assert_eq!(calculate_tax(Decimal::new(5000, 0), &schedule), Decimal::new(625, 0));
/// ```
pub fn calculate_tax(taxable_income: Decimal, schedule: &TaxSchedule) -> Decimal {
    let total: Decimal = split_into_brackets(taxable_income, schedule)
        .iter()
        .map(|b| b.tax)
        .sum();
    round_money(total)
}

/// Calculates progressive income tax and records an audit step listing
/// the tax owed in each band.
pub fn calculate_tax_with_audit(
    taxable_income: Decimal,
    schedule: &TaxSchedule,
    step_number: u32,
) -> TaxCalculationResult {
    let brackets = split_into_brackets(taxable_income, schedule);
    let tax = round_money(brackets.iter().map(|b| b.tax).sum());

    let bands: Vec<serde_json::Value> = brackets
        .iter()
        .map(|b| {
            serde_json::json!({
                "lower": b.lower.normalize().to_string(),
                "upper": b.upper.map(|u| u.normalize().to_string()),
                "rate": b.rate.normalize().to_string(),
                "taxed_amount": b.taxed_amount.normalize().to_string(),
                "tax": b.tax.normalize().to_string()
            })
        })
        .collect();

    let reasoning = if brackets.is_empty() {
        format!("No tax due on ${}", taxable_income.normalize())
    } else {
        let parts: Vec<String> = brackets
            .iter()
            .map(|b| {
                format!(
                    "${} x {} = ${}",
                    b.taxed_amount.normalize(),
                    b.rate.normalize(),
                    b.tax.normalize()
                )
            })
            .collect();
        format!("{} => ${}", parts.join(" + "), tax.normalize())
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "progressive_tax".to_string(),
        rule_name: "Progressive Income Tax".to_string(),
        input: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string()
        }),
        output: serde_json::json!({
            "tax": tax.normalize().to_string(),
            "bands": bands
        }),
        reasoning,
    };

    TaxCalculationResult {
        tax,
        brackets,
        audit_step,
    }
}
