//! Loan agreement and repayment models.
//!
//! A [`LoanAgreement`] is produced by
//! [`generate_schedule`](crate::calculation::generate_schedule) and updated
//! only by returning new copies from the loan engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Terms supplied by the caller when a loan is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Identifier of the loan, used as the prefix for payment ids.
    pub loan_id: String,
    /// Identifier of the borrower.
    pub borrower_id: String,
    /// Amount financed.
    pub principal: Decimal,
    /// Annual interest rate in percent (e.g. `5` for 5%).
    pub interest_rate: Decimal,
    /// Number of monthly instalments.
    pub term_months: u32,
    /// Date the loan was issued; the first instalment is due one month later.
    pub start_date: NaiveDate,
}

/// Lifecycle status of a loan agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Instalments are still outstanding.
    Active,
    /// Every instalment has been paid.
    Completed,
    /// The borrower defaulted; no further collection is expected.
    Defaulted,
}

/// Status of a single instalment.
///
/// Only `Pending` and `Paid` are ever stored. `Overdue` is derived at read
/// time by [`payment_status`](crate::calculation::payment_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet paid and not yet due.
    Pending,
    /// Paid.
    Paid,
    /// Not paid and past its due date.
    Overdue,
}

/// A single scheduled instalment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPayment {
    /// Unique identifier (`"{loan_id}-{sequence:03}"`).
    pub id: String,
    /// 1-based position in the schedule.
    pub sequence: u32,
    /// Amount due.
    pub amount: Decimal,
    /// Portion of `amount` repaying principal.
    pub principal_portion: Decimal,
    /// Portion of `amount` paying interest.
    pub interest_portion: Decimal,
    /// Principal still owed after this instalment.
    pub remaining_balance: Decimal,
    /// Date the instalment is due.
    pub due_date: NaiveDate,
    /// Stored status (`Pending` or `Paid`).
    pub status: PaymentStatus,
    /// Date the instalment was paid, if it was.
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

impl LoanPayment {
    /// Returns true if the instalment has been paid.
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// A loan with its full repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanAgreement {
    /// Loan identifier.
    pub id: String,
    /// Borrower identifier.
    pub borrower_id: String,
    /// Amount financed.
    pub principal: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Number of monthly instalments.
    pub term_months: u32,
    /// Regular instalment amount (the final one may differ by rounding).
    pub monthly_payment: Decimal,
    /// Sum of all instalment amounts (principal plus interest).
    pub total_amount: Decimal,
    /// Interest portion of `total_amount`.
    pub total_interest: Decimal,
    /// Date the loan was issued.
    pub start_date: NaiveDate,
    /// Due date of the final instalment.
    pub end_date: NaiveDate,
    /// Instalments ordered by due date.
    pub payments: Vec<LoanPayment>,
    /// Lifecycle status.
    pub status: LoanStatus,
}

impl LoanAgreement {
    /// Sum of the instalments already paid.
    pub fn amount_repaid(&self) -> EngineResult<Decimal> {
        self.sum_payments(true, "amount repaid")
    }

    /// Sum of the instalments not yet paid.
    pub fn amount_outstanding(&self) -> EngineResult<Decimal> {
        self.sum_payments(false, "amount outstanding")
    }

    fn sum_payments(&self, paid: bool, what: &str) -> EngineResult<Decimal> {
        self.payments
            .iter()
            .filter(|p| p.is_paid() == paid)
            .try_fold(Decimal::ZERO, |total, p| {
                total
                    .checked_add(p.amount)
                    .ok_or_else(|| EngineError::overflow(what))
            })
    }

    /// Finds an instalment by id.
    pub fn payment(&self, payment_id: &str) -> Option<&LoanPayment> {
        self.payments.iter().find(|p| p.id == payment_id)
    }
}

/// Aggregate figures across a set of loan agreements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPortfolioSummary {
    /// Total repayable value of active agreements.
    pub total_active_value: Decimal,
    /// Unpaid instalments across active agreements.
    pub total_outstanding: Decimal,
    /// Paid instalments across all agreements.
    pub total_repaid: Decimal,
    /// Number of unpaid instalments past their due date on active agreements.
    pub overdue_payments: u32,
    /// Number of distinct borrowers with an active agreement.
    pub active_borrowers: u32,
    /// Number of active agreements.
    pub active_loans: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn payment(sequence: u32, amount: &str, status: PaymentStatus) -> LoanPayment {
        LoanPayment {
            id: format!("loan_001-{:03}", sequence),
            sequence,
            amount: dec(amount),
            principal_portion: dec(amount),
            interest_portion: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
            due_date: NaiveDate::from_ymd_opt(2026, sequence, 1).unwrap(),
            status,
            paid_date: None,
        }
    }

    fn agreement(payments: Vec<LoanPayment>) -> LoanAgreement {
        let total = payments
            .iter()
            .try_fold(Decimal::ZERO, |t, p| t.checked_add(p.amount))
            .unwrap_or(Decimal::MAX);
        LoanAgreement {
            id: "loan_001".to_string(),
            borrower_id: "cust_001".to_string(),
            principal: total,
            interest_rate: Decimal::ZERO,
            term_months: payments.len() as u32,
            monthly_payment: dec("100"),
            total_amount: total,
            total_interest: Decimal::ZERO,
            start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            payments,
            status: LoanStatus::Active,
        }
    }

    #[test]
    fn test_amount_repaid_and_outstanding() {
        let loan = agreement(vec![
            payment(1, "100", PaymentStatus::Paid),
            payment(2, "100", PaymentStatus::Pending),
            payment(3, "100.50", PaymentStatus::Pending),
        ]);

        assert_eq!(loan.amount_repaid().unwrap(), dec("100"));
        assert_eq!(loan.amount_outstanding().unwrap(), dec("200.50"));
    }

    #[test]
    fn test_outstanding_overflow_is_an_error() {
        let loan = agreement(vec![
            payment(1, "79228162514264337593543950335", PaymentStatus::Pending),
            payment(2, "1", PaymentStatus::Pending),
        ]);

        assert!(matches!(
            loan.amount_outstanding(),
            Err(EngineError::CalculationError { .. })
        ));
        assert_eq!(loan.amount_repaid().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_payment_lookup_by_id() {
        let loan = agreement(vec![
            payment(1, "100", PaymentStatus::Pending),
            payment(2, "100", PaymentStatus::Pending),
        ]);

        assert_eq!(loan.payment("loan_001-002").map(|p| p.sequence), Some(2));
        assert!(loan.payment("loan_001-009").is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LoanStatus::Defaulted).unwrap(),
            "\"defaulted\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Overdue).unwrap(),
            "\"overdue\""
        );
    }

    #[test]
    fn test_payment_deserializes_without_paid_date() {
        let json = r#"{
            "id": "loan_001-001",
            "sequence": 1,
            "amount": "1027.29",
            "principal_portion": "977.29",
            "interest_portion": "50.00",
            "remaining_balance": "11022.71",
            "due_date": "2026-02-01",
            "status": "pending"
        }"#;

        let payment: LoanPayment = serde_json::from_str(json).unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.paid_date, None);
        assert!(!payment.is_paid());
    }
}
