//! HTTP API module for the business calculation engine.
//!
//! This module exposes the engines as JSON endpoints so the application's
//! views can call them over HTTP.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    DemandRecordRequest, ForecastRequest, LoanScheduleRequest, PayrollRequest,
    PortfolioSummaryRequest, RecordPaymentRequest, RecordTimestamp, TaxRequest,
};
pub use response::{ApiError, ApiErrorResponse, PayrollResponse, TaxResponse};
pub use state::AppState;
