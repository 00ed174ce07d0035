//! Property tests for the calculation engines.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use bizcalc_engine::calculation::{
    calculate_payroll, calculate_payroll_components, calculate_tax, forecast, generate_schedule,
    record_payment, MAX_TERM_MONTHS,
};
use bizcalc_engine::config::{EngineConfig, ForecastSettings, TaxSchedule};
use bizcalc_engine::error::EngineError;
use bizcalc_engine::models::{DemandPoint, LoanTerms, PayrollVariant, SalaryInput};

/// Non-negative amount in cents up to `max_units`.
fn amount(max_units: i64) -> impl Strategy<Value = Decimal> {
    (0..=max_units * 100).prop_map(|cents| Decimal::new(cents, 2))
}

fn salary_input() -> impl Strategy<Value = SalaryInput> {
    (amount(50_000), amount(200), amount(10_000)).prop_map(
        |(basic_salary, overtime_hours, bonuses)| SalaryInput {
            basic_salary,
            overtime_hours,
            bonuses,
        },
    )
}

fn loan_terms() -> impl Strategy<Value = LoanTerms> {
    (100i64..=100_000_000, 0i64..=3_000, 1u32..=360, 0u32..=27).prop_map(
        |(principal_cents, rate_hundredths, term_months, day_offset)| LoanTerms {
            loan_id: "loan_prop".to_string(),
            borrower_id: "cust_prop".to_string(),
            principal: Decimal::new(principal_cents, 2),
            interest_rate: Decimal::new(rate_hundredths, 2),
            term_months,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1 + day_offset).unwrap(),
        },
    )
}

/// Any non-negative decimal, from cents up to `Decimal::MAX`.
fn any_non_negative() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, scale)| Decimal::from_parts(lo, mid, hi, false, scale))
}

fn extreme_salary_input() -> impl Strategy<Value = SalaryInput> {
    (any_non_negative(), any_non_negative(), any_non_negative()).prop_map(
        |(basic_salary, overtime_hours, bonuses)| SalaryInput {
            basic_salary,
            overtime_hours,
            bonuses,
        },
    )
}

fn extreme_loan_terms() -> impl Strategy<Value = LoanTerms> {
    (
        any_non_negative(),
        0i64..=100_000,
        prop_oneof![1u32..=MAX_TERM_MONTHS, any::<u32>()],
    )
        .prop_map(|(principal, rate_hundredths, term_months)| LoanTerms {
            loan_id: "loan_edge".to_string(),
            borrower_id: "cust_edge".to_string(),
            principal,
            interest_rate: Decimal::new(rate_hundredths, 2),
            term_months,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        })
}

fn demand_history() -> impl Strategy<Value = Vec<DemandPoint>> {
    prop::collection::vec((1u32..=12, 1u32..=28, 0i64..=1_000), 0..24).prop_map(|records| {
        records
            .into_iter()
            .map(|(month, day, quantity)| {
                DemandPoint::new(
                    NaiveDate::from_ymd_opt(2025, month, day).unwrap(),
                    Decimal::from(quantity),
                )
            })
            .collect()
    })
}

proptest! {
    /// The same salary always yields the same payslip.
    #[test]
    fn payroll_is_deterministic(salary in salary_input()) {
        let config = EngineConfig::default();
        let a = calculate_payroll_components(&salary, &config, 1).unwrap();
        let b = calculate_payroll_components(&salary, &config, 1).unwrap();
        prop_assert_eq!(a.breakdown, b.breakdown);
    }

    /// Net salary is taxable income plus benefits less the sum of deductions.
    #[test]
    fn payroll_totals_are_consistent(salary in salary_input()) {
        let b = calculate_payroll_components(&salary, &EngineConfig::default(), 1)
            .unwrap()
            .breakdown;

        prop_assert_eq!(b.deductions, b.taxes + b.social_security + b.health_insurance);
        prop_assert_eq!(b.net_salary, b.taxable_income + b.benefits - b.deductions);
        prop_assert_eq!(
            b.taxable_income,
            b.basic_salary + b.overtime_pay + b.bonuses
        );
    }

    /// Tax never decreases as income grows.
    #[test]
    fn tax_is_monotonic(a in amount(100_000), b in amount(100_000)) {
        let schedule = TaxSchedule::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calculate_tax(low, &schedule) <= calculate_tax(high, &schedule));
    }

    /// Tax never exceeds the top marginal rate applied to the whole income.
    #[test]
    fn tax_is_bounded_by_top_rate(income in amount(100_000)) {
        let tax = calculate_tax(income, &TaxSchedule::default());
        prop_assert!(tax >= Decimal::ZERO);
        prop_assert!(tax <= income * Decimal::new(25, 2) + Decimal::new(1, 2));
    }

    /// Instalments add up to the total and repay exactly the principal.
    #[test]
    fn schedule_amounts_sum_to_total(terms in loan_terms()) {
        let loan = generate_schedule(&terms).unwrap();

        let amounts: Decimal = loan.payments.iter().map(|p| p.amount).sum();
        let principal: Decimal = loan.payments.iter().map(|p| p.principal_portion).sum();

        prop_assert_eq!(loan.payments.len(), terms.term_months as usize);
        prop_assert_eq!(amounts, loan.total_amount);
        prop_assert_eq!(principal, terms.principal);
        prop_assert_eq!(loan.payments.last().unwrap().remaining_balance, Decimal::ZERO);
        prop_assert!(loan.payments.windows(2).all(|w| w[0].due_date < w[1].due_date));
    }

    /// A payment can be recorded once; the second attempt is rejected.
    #[test]
    fn payment_cannot_be_recorded_twice(terms in loan_terms(), pick in any::<prop::sample::Index>()) {
        let loan = generate_schedule(&terms).unwrap();
        let target = &loan.payments[pick.index(loan.payments.len())];
        let paid_on = target.due_date;

        let updated = record_payment(&loan, &target.id, paid_on).unwrap();
        let paid = updated.payments.iter().filter(|p| p.is_paid()).count();
        prop_assert_eq!(paid, 1);

        let second = record_payment(&updated, &target.id, paid_on);
        let rejected = matches!(second, Err(EngineError::InvalidPaymentState { .. }));
        prop_assert!(rejected);
    }

    /// Forecast outputs stay within their ranges for any history.
    #[test]
    fn forecast_outputs_in_range(history in demand_history(), stock in 0i64..=500) {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let result = forecast(&history, Decimal::from(stock), as_of, &ForecastSettings::default());

        prop_assert!(result.confidence >= Decimal::ZERO);
        prop_assert!(result.confidence <= Decimal::ONE_HUNDRED);
        prop_assert!(result.predicted_demand >= Decimal::ZERO);
        prop_assert!(result.recommended_order >= Decimal::ZERO);
        prop_assert_eq!(result.predicted_demand.fract(), Decimal::ZERO);
        prop_assert_eq!(result.sample_size, history.len());
    }

    /// Payroll over the whole decimal range either succeeds with consistent
    /// totals or reports a calculation error; it never panics.
    #[test]
    fn payroll_handles_extreme_amounts(
        salary in extreme_salary_input(),
        flat in any::<bool>(),
    ) {
        let variant = if flat { PayrollVariant::FlatRate } else { PayrollVariant::Progressive };
        match calculate_payroll(&salary, variant, &EngineConfig::default(), 1) {
            Ok(result) => {
                let b = result.breakdown;
                prop_assert_eq!(b.net_salary, b.taxable_income + b.benefits - b.deductions);
            }
            Err(err) => {
                let is_overflow = matches!(err, EngineError::CalculationError { .. });
                prop_assert!(is_overflow);
            }
        }
    }

    /// Oversized terms are rejected and huge principals end in an error,
    /// never in a panic or an unbounded allocation.
    #[test]
    fn schedule_handles_extreme_terms(terms in extreme_loan_terms()) {
        match generate_schedule(&terms) {
            Ok(loan) => {
                prop_assert!(terms.term_months <= MAX_TERM_MONTHS);
                prop_assert_eq!(loan.payments.len(), terms.term_months as usize);
            }
            Err(EngineError::InvalidLoanTerms { .. }) => {
                prop_assert!(terms.term_months > MAX_TERM_MONTHS || terms.principal.is_zero());
            }
            Err(err) => {
                let is_overflow = matches!(err, EngineError::CalculationError { .. });
                prop_assert!(is_overflow);
            }
        }
    }

    /// Forecasts over arbitrarily large quantities stay in range.
    #[test]
    fn forecast_handles_extreme_quantities(
        quantities in prop::collection::vec(any_non_negative(), 0..12),
        stock in any_non_negative(),
    ) {
        let history: Vec<DemandPoint> = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| {
                DemandPoint::new(NaiveDate::from_ymd_opt(2025, i as u32 + 1, 1).unwrap(), *q)
            })
            .collect();
        let as_of = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let result = forecast(&history, stock, as_of, &ForecastSettings::default());

        prop_assert!(result.confidence >= Decimal::ZERO);
        prop_assert!(result.confidence <= Decimal::ONE_HUNDRED);
        prop_assert!(result.predicted_demand >= Decimal::ZERO);
        prop_assert!(result.recommended_order >= Decimal::ZERO);
        prop_assert_eq!(result.sample_size, history.len());
    }
}
