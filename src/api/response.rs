//! Response types for the HTTP adapter.
//!
//! This module defines the success bodies that wrap engine results and the
//! error response structures the handlers return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{AuditStep, AuditTrace, PayrollBreakdown};

/// Response body for `POST /tax`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxResponse {
    /// Income the tax was computed on.
    pub taxable_income: Decimal,
    /// Tax owed, rounded to cents.
    pub tax: Decimal,
    /// Per-band breakdown of the calculation.
    pub audit_step: AuditStep,
}

/// Response body for `POST /payroll`.
///
/// Wraps the breakdown with identifiers and a full audit trace so that the
/// payslip can be stored and explained later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollResponse {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// Version of the engine that produced the result.
    pub engine_version: String,
    /// The employee the payslip is for.
    pub employee_id: String,
    /// The computed payslip components.
    pub breakdown: PayrollBreakdown,
    /// Rule-by-rule trace of the calculation.
    pub audit_trace: AuditTrace,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::InvalidInput { field, message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "VALIDATION_ERROR",
                    format!("Invalid field '{}': {}", field, message),
                    "The request contains an out-of-range value",
                ),
            },
            EngineError::InvalidLoanTerms { message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "INVALID_LOAN_TERMS",
                    format!("Invalid loan terms: {}", message),
                    "The loan cannot be amortized with these terms",
                ),
            },
            EngineError::InvalidPaymentState {
                payment_id,
                message,
            } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "INVALID_PAYMENT_STATE",
                    format!("Invalid payment state for '{}': {}", payment_id, message),
                    "The requested transition is not allowed from the current state",
                ),
            },
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
            EngineError::InvalidConfig { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("CONFIG_ERROR", "Invalid configuration", message),
            },
            EngineError::CalculationError { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            },
        }
    }
}
