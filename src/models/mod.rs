//! Core data models for the calculation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod forecast;
mod loan;
mod salary;

pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use forecast::{DemandPoint, ForecastItem, ForecastResult};
pub use loan::{LoanAgreement, LoanPayment, LoanPortfolioSummary, LoanStatus, LoanTerms, PaymentStatus};
pub use salary::{PayrollBreakdown, PayrollVariant, SalaryInput};
