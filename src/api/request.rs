//! Request types for the HTTP adapter.
//!
//! These types sit between the loosely typed documents the surrounding
//! application stores and the strict engine inputs. Timestamps arrive in
//! several shapes and amounts as numbers or strings; everything is
//! validated and normalized here before it reaches an engine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{DemandPoint, LoanAgreement, LoanTerms, PayrollVariant, SalaryInput};

/// A timestamp as stored by the document store or sent by a view.
///
/// Accepted shapes:
/// - a calendar date: `"2026-01-13"`
/// - an RFC 3339 datetime: `"2026-01-13T09:30:00Z"`
/// - a store timestamp object: `{ "seconds": 1768262400, "nanoseconds": 0 }`
/// - epoch milliseconds: `1768262400000`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTimestamp {
    /// A plain calendar date.
    Date(NaiveDate),
    /// A UTC datetime.
    DateTime(DateTime<Utc>),
    /// A document-store timestamp.
    StoreTimestamp {
        /// Whole seconds since the Unix epoch.
        seconds: i64,
        /// Sub-second nanoseconds.
        #[serde(default)]
        nanoseconds: u32,
    },
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
}

impl RecordTimestamp {
    /// Normalizes the timestamp to a UTC calendar date.
    ///
    /// `field` names the request field in the error when the value is out
    /// of the representable range.
    pub fn to_date(&self, field: &str) -> EngineResult<NaiveDate> {
        let date = match self {
            RecordTimestamp::Date(date) => Some(*date),
            RecordTimestamp::DateTime(datetime) => Some(datetime.date_naive()),
            RecordTimestamp::StoreTimestamp {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds).map(|dt| dt.date_naive()),
            RecordTimestamp::EpochMillis(millis) => {
                DateTime::from_timestamp_millis(*millis).map(|dt| dt.date_naive())
            }
        };

        date.ok_or_else(|| EngineError::invalid_input(field, "timestamp out of range"))
    }
}

impl From<NaiveDate> for RecordTimestamp {
    fn from(date: NaiveDate) -> Self {
        RecordTimestamp::Date(date)
    }
}

/// Resolves an optional evaluation date, falling back to `today`.
fn resolve_as_of(
    as_of: Option<&RecordTimestamp>,
    today: NaiveDate,
    field: &str,
) -> EngineResult<NaiveDate> {
    match as_of {
        Some(timestamp) => timestamp.to_date(field),
        None => Ok(today),
    }
}

fn require_non_negative(value: Decimal, field: &str) -> EngineResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(EngineError::invalid_input(field, "must not be negative"));
    }
    Ok(value)
}

/// Request body for `POST /tax`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRequest {
    /// Monthly taxable income.
    pub taxable_income: Decimal,
}

impl TaxRequest {
    /// Returns the validated taxable income.
    pub fn taxable_income(&self) -> EngineResult<Decimal> {
        require_non_negative(self.taxable_income, "taxable_income")
    }
}

/// Request body for `POST /payroll`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRequest {
    /// Employee the payslip is for.
    pub employee_id: String,
    /// Payroll formula; progressive unless stated.
    #[serde(default)]
    pub variant: PayrollVariant,
    /// Salary figures for the period.
    pub salary: SalaryInput,
}

/// Request body for `POST /loans/schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleRequest {
    /// Identifier of the loan.
    pub loan_id: String,
    /// Identifier of the borrower.
    pub borrower_id: String,
    /// Amount financed.
    pub principal: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Number of monthly instalments; from 1 to 600.
    pub term_months: i64,
    /// Issue date of the loan.
    pub start_date: RecordTimestamp,
}

impl TryFrom<LoanScheduleRequest> for LoanTerms {
    type Error = EngineError;

    fn try_from(req: LoanScheduleRequest) -> Result<Self, Self::Error> {
        if req.term_months <= 0 {
            return Err(EngineError::InvalidLoanTerms {
                message: format!("term must be at least one month, got {}", req.term_months),
            });
        }
        let term_months = u32::try_from(req.term_months).map_err(|_| EngineError::InvalidLoanTerms {
            message: format!("term of {} months is too long", req.term_months),
        })?;

        Ok(LoanTerms {
            loan_id: req.loan_id,
            borrower_id: req.borrower_id,
            principal: req.principal,
            interest_rate: req.interest_rate,
            term_months,
            start_date: req.start_date.to_date("start_date")?,
        })
    }
}

/// Request body for `POST /loans/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    /// Current state of the agreement.
    pub agreement: LoanAgreement,
    /// Payment being settled.
    pub payment_id: String,
    /// Settlement date; today when omitted.
    #[serde(default)]
    pub paid_on: Option<RecordTimestamp>,
}

impl RecordPaymentRequest {
    /// Returns the settlement date.
    pub fn paid_on(&self, today: NaiveDate) -> EngineResult<NaiveDate> {
        resolve_as_of(self.paid_on.as_ref(), today, "paid_on")
    }
}

/// Request body for `POST /loans/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummaryRequest {
    /// Agreements in the portfolio.
    pub agreements: Vec<LoanAgreement>,
    /// Evaluation date for overdue detection; today when omitted.
    #[serde(default)]
    pub as_of: Option<RecordTimestamp>,
}

impl PortfolioSummaryRequest {
    /// Returns the evaluation date.
    pub fn as_of(&self, today: NaiveDate) -> EngineResult<NaiveDate> {
        resolve_as_of(self.as_of.as_ref(), today, "as_of")
    }
}

/// One sales record in a forecast request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRecordRequest {
    /// When the sale happened.
    pub date: RecordTimestamp,
    /// Quantity sold.
    pub quantity: Decimal,
}

/// Request body for `POST /forecast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Inventory item being forecast.
    pub item_id: String,
    /// Units currently in stock.
    pub current_stock: Decimal,
    /// Date whose month drives the seasonal factor; today when omitted.
    #[serde(default)]
    pub as_of: Option<RecordTimestamp>,
    /// Sales history, in any order.
    #[serde(default)]
    pub history: Vec<DemandRecordRequest>,
}

impl ForecastRequest {
    /// Returns the validated stock level.
    pub fn current_stock(&self) -> EngineResult<Decimal> {
        require_non_negative(self.current_stock, "current_stock")
    }

    /// Returns the evaluation date.
    pub fn as_of(&self, today: NaiveDate) -> EngineResult<NaiveDate> {
        resolve_as_of(self.as_of.as_ref(), today, "as_of")
    }

    /// Normalizes the sales history into demand points.
    pub fn history(&self) -> EngineResult<Vec<DemandPoint>> {
        self.history
            .iter()
            .enumerate()
            .map(|(i, record)| -> EngineResult<DemandPoint> {
                let quantity =
                    require_non_negative(record.quantity, &format!("history[{}].quantity", i))?;
                let date = record.date.to_date(&format!("history[{}].date", i))?;
                Ok(DemandPoint::new(date, quantity))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_timestamp_from_date_string() {
        let ts: RecordTimestamp = serde_json::from_str(r#""2026-01-13""#).unwrap();
        assert_eq!(ts, RecordTimestamp::Date(date(2026, 1, 13)));
        assert_eq!(ts.to_date("date").unwrap(), date(2026, 1, 13));
    }

    #[test]
    fn test_timestamp_from_rfc3339_string() {
        let ts: RecordTimestamp = serde_json::from_str(r#""2026-01-13T23:30:00Z""#).unwrap();
        assert_eq!(ts.to_date("date").unwrap(), date(2026, 1, 13));
    }

    #[test]
    fn test_timestamp_from_store_object() {
        // 2026-01-13T00:00:00Z
        let ts: RecordTimestamp =
            serde_json::from_str(r#"{"seconds": 1768262400, "nanoseconds": 500}"#).unwrap();
        assert_eq!(ts.to_date("date").unwrap(), date(2026, 1, 13));
    }

    #[test]
    fn test_timestamp_from_epoch_millis() {
        let ts: RecordTimestamp = serde_json::from_str("1768262400000").unwrap();
        assert_eq!(ts, RecordTimestamp::EpochMillis(1_768_262_400_000));
        assert_eq!(ts.to_date("date").unwrap(), date(2026, 1, 13));
    }

    #[test]
    fn test_timestamp_out_of_range_rejected() {
        let ts = RecordTimestamp::EpochMillis(i64::MAX);
        assert!(matches!(
            ts.to_date("start_date"),
            Err(EngineError::InvalidInput { field, .. }) if field == "start_date"
        ));
    }

    #[test]
    fn test_payroll_request_defaults_to_progressive() {
        let json = r#"{
            "employee_id": "emp_001",
            "salary": { "basic_salary": "4000", "overtime_hours": 10 }
        }"#;

        let request: PayrollRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.variant, PayrollVariant::Progressive);
        assert_eq!(request.salary.basic_salary, Decimal::new(4000, 0));
        assert_eq!(request.salary.bonuses, Decimal::ZERO);
    }

    #[test]
    fn test_loan_request_conversion() {
        let json = r#"{
            "loan_id": "loan_001",
            "borrower_id": "emp_001",
            "principal": 12000,
            "interest_rate": "5",
            "term_months": 12,
            "start_date": "2026-01-15"
        }"#;

        let request: LoanScheduleRequest = serde_json::from_str(json).unwrap();
        let terms = LoanTerms::try_from(request).unwrap();
        assert_eq!(terms.term_months, 12);
        assert_eq!(terms.start_date, date(2026, 1, 15));
    }

    #[test]
    fn test_loan_request_negative_term_rejected() {
        let request = LoanScheduleRequest {
            loan_id: "loan_001".to_string(),
            borrower_id: "emp_001".to_string(),
            principal: Decimal::new(12000, 0),
            interest_rate: Decimal::new(5, 0),
            term_months: -3,
            start_date: date(2026, 1, 15).into(),
        };

        assert!(matches!(
            LoanTerms::try_from(request),
            Err(EngineError::InvalidLoanTerms { .. })
        ));
    }

    #[test]
    fn test_forecast_request_normalizes_history() {
        let json = r#"{
            "item_id": "sku_001",
            "current_stock": "12",
            "history": [
                { "date": "2026-02-01", "quantity": 5 },
                { "date": { "seconds": 1768262400 }, "quantity": "7.5" }
            ]
        }"#;

        let request: ForecastRequest = serde_json::from_str(json).unwrap();
        let history = request.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].date, date(2026, 1, 13));
        assert_eq!(history[1].quantity, Decimal::from_str("7.5").unwrap());
        assert_eq!(request.as_of(date(2026, 10, 19)).unwrap(), date(2026, 10, 19));
    }

    #[test]
    fn test_forecast_request_negative_quantity_rejected() {
        let request = ForecastRequest {
            item_id: "sku_001".to_string(),
            current_stock: Decimal::ZERO,
            as_of: None,
            history: vec![DemandRecordRequest {
                date: date(2026, 1, 1).into(),
                quantity: Decimal::new(-1, 0),
            }],
        };

        assert!(matches!(
            request.history(),
            Err(EngineError::InvalidInput { field, .. }) if field == "history[0].quantity"
        ));
    }

    #[test]
    fn test_negative_taxable_income_rejected() {
        let request = TaxRequest {
            taxable_income: Decimal::new(-100, 0),
        };
        assert!(request.taxable_income().is_err());
    }
}
