//! HTTP request handlers for the business calculation engine.
//!
//! Each handler parses its body, normalizes it through the request adapter,
//! calls one engine and wraps the result. Dates that default to "today" are
//! resolved here and nowhere else.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    calculate_payroll, calculate_tax_with_audit, forecast_item, generate_schedule,
    record_payment, summarize_portfolio,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditTrace, ForecastItem, LoanAgreement, LoanPortfolioSummary, LoanTerms};

use super::request::{
    ForecastRequest, LoanScheduleRequest, PayrollRequest, PortfolioSummaryRequest,
    RecordPaymentRequest, TaxRequest,
};
use super::response::{ApiError, ApiErrorResponse, PayrollResponse, TaxResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/tax", post(tax_handler))
        .route("/payroll", post(payroll_handler))
        .route("/loans/schedule", post(loan_schedule_handler))
        .route("/loans/payments", post(record_payment_handler))
        .route("/loans/summary", post(portfolio_summary_handler))
        .route("/forecast", post(forecast_handler))
        .with_state(state)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, error: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %error,
        "Calculation failed"
    );
    let api_error: ApiErrorResponse = error.into();
    json_response(api_error.status, api_error.error)
}

/// Unwraps a JSON body or builds the 400 response describing why it was rejected.
fn parse_payload<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(request)) => return Ok(request),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };

    Err(json_response(StatusCode::BAD_REQUEST, error))
}

/// Handler for POST /tax.
async fn tax_handler(
    State(state): State<AppState>,
    payload: Result<Json<TaxRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing tax request");

    let request = match parse_payload(correlation_id, payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match perform_tax(&request, state.config()) {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                taxable_income = %response.taxable_income,
                tax = %response.tax,
                "Tax calculation completed"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn perform_tax(request: &TaxRequest, config: &EngineConfig) -> EngineResult<TaxResponse> {
    let taxable_income = request.taxable_income()?;
    let result = calculate_tax_with_audit(taxable_income, config.tax_schedule(), 1);
    Ok(TaxResponse {
        taxable_income,
        tax: result.tax,
        audit_step: result.audit_step,
    })
}

/// Handler for POST /payroll.
async fn payroll_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll request");

    let request = match parse_payload(correlation_id, payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match perform_payroll(&request, state.config()) {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %response.employee_id,
                variant = ?request.variant,
                net_salary = %response.breakdown.net_salary,
                duration_us = response.audit_trace.duration_us,
                "Payroll calculation completed"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn perform_payroll(request: &PayrollRequest, config: &EngineConfig) -> EngineResult<PayrollResponse> {
    let start_time = Instant::now();
    let calculation = calculate_payroll(&request.salary, request.variant, config, 1)?;
    let duration_us = start_time.elapsed().as_micros() as u64;

    Ok(PayrollResponse {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        employee_id: request.employee_id.clone(),
        breakdown: calculation.breakdown,
        audit_trace: AuditTrace {
            steps: calculation.audit_steps,
            warnings: calculation.warnings,
            duration_us,
        },
    })
}

/// Handler for POST /loans/schedule.
async fn loan_schedule_handler(
    payload: Result<Json<LoanScheduleRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing loan schedule request");

    let request = match parse_payload(correlation_id, payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let result = LoanTerms::try_from(request).and_then(|terms| generate_schedule(&terms));
    match result {
        Ok(agreement) => {
            info!(
                correlation_id = %correlation_id,
                loan_id = %agreement.id,
                monthly_payment = %agreement.monthly_payment,
                payments = agreement.payments.len(),
                "Loan schedule generated"
            );
            json_response(StatusCode::OK, agreement)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /loans/payments.
async fn record_payment_handler(
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing loan payment");

    let request = match parse_payload(correlation_id, payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match perform_record_payment(&request, today()) {
        Ok(agreement) => {
            info!(
                correlation_id = %correlation_id,
                loan_id = %agreement.id,
                payment_id = %request.payment_id,
                status = ?agreement.status,
                "Loan payment recorded"
            );
            json_response(StatusCode::OK, agreement)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn perform_record_payment(
    request: &RecordPaymentRequest,
    today: NaiveDate,
) -> EngineResult<LoanAgreement> {
    let paid_on = request.paid_on(today)?;
    record_payment(&request.agreement, &request.payment_id, paid_on)
}

/// Handler for POST /loans/summary.
async fn portfolio_summary_handler(
    payload: Result<Json<PortfolioSummaryRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing portfolio summary");

    let request = match parse_payload(correlation_id, payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match perform_portfolio_summary(&request, today()) {
        Ok(summary) => {
            info!(
                correlation_id = %correlation_id,
                agreements = request.agreements.len(),
                active_loans = summary.active_loans,
                overdue_payments = summary.overdue_payments,
                "Portfolio summary completed"
            );
            json_response(StatusCode::OK, summary)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn perform_portfolio_summary(
    request: &PortfolioSummaryRequest,
    today: NaiveDate,
) -> EngineResult<LoanPortfolioSummary> {
    let as_of = request.as_of(today)?;
    summarize_portfolio(&request.agreements, as_of)
}

/// Handler for POST /forecast.
async fn forecast_handler(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing forecast request");

    let request = match parse_payload(correlation_id, payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match perform_forecast(&request, state.config(), today()) {
        Ok(item) => {
            info!(
                correlation_id = %correlation_id,
                item_id = %item.item_id,
                predicted_demand = %item.forecast.predicted_demand,
                confidence = %item.forecast.confidence,
                "Forecast completed"
            );
            json_response(StatusCode::OK, item)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn perform_forecast(
    request: &ForecastRequest,
    config: &EngineConfig,
    today: NaiveDate,
) -> EngineResult<ForecastItem> {
    let current_stock = request.current_stock()?;
    let as_of = request.as_of(today)?;
    let history = request.history()?;

    Ok(forecast_item(
        &request.item_id,
        &history,
        current_stock,
        as_of,
        config.forecast_settings(),
    ))
}
