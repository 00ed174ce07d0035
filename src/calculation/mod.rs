//! Calculation logic for the business calculation engine.
//!
//! This module contains the engines themselves: progressive income tax,
//! payroll components (with the legacy flat-rate variant), loan amortization
//! with payment tracking and portfolio summaries, and demand forecasting.
//! Every function here is pure: dates such as "today" are passed in.

mod forecast;
mod loan;
mod payroll;
mod rounding;
mod tax;

pub use forecast::{forecast, forecast_item};
pub use loan::{
    MAX_TERM_MONTHS, PAYMENTS_PER_YEAR, generate_schedule, mark_defaulted, monthly_payment, payment_id,
    payment_status, record_payment, summarize_portfolio,
};
pub use payroll::{
    PayrollCalculation, calculate_flat_rate_payroll, calculate_payroll,
    calculate_payroll_components,
};
pub use rounding::{MONEY_DECIMAL_PLACES, round_money, round_units};
pub use tax::{BracketTax, TaxCalculationResult, calculate_tax, calculate_tax_with_audit};
