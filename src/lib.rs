//! Business Calculation Engine
//!
//! This crate provides the numeric engines behind a business-management
//! application: progressive tax, payroll components, loan amortization and
//! demand forecasting, plus a thin JSON-over-HTTP adapter.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
