//! Loan amortization scheduling and repayment tracking.
//!
//! A schedule is generated once from the loan terms. Repayments are then
//! recorded by returning an updated copy of the agreement; the agreement
//! passed in is never modified, so a rejected transition leaves the
//! caller's data untouched.

use std::collections::BTreeSet;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    LoanAgreement, LoanPayment, LoanPortfolioSummary, LoanStatus, LoanTerms, PaymentStatus,
};

use super::rounding::round_money;

/// Number of instalments per year.
pub const PAYMENTS_PER_YEAR: u32 = 12;

/// Longest accepted term, in months (50 years).
pub const MAX_TERM_MONTHS: u32 = 600;

/// Builds the id of the `sequence`-th instalment of `loan_id`.
pub fn payment_id(loan_id: &str, sequence: u32) -> String {
    format!("{}-{:03}", loan_id, sequence)
}

fn validate_term(term_months: u32) -> EngineResult<()> {
    if term_months == 0 {
        return Err(EngineError::InvalidLoanTerms {
            message: "term_months must be greater than zero".to_string(),
        });
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(EngineError::InvalidLoanTerms {
            message: format!(
                "term_months must not exceed {} (got {})",
                MAX_TERM_MONTHS, term_months
            ),
        });
    }
    Ok(())
}

fn validate_terms(terms: &LoanTerms) -> EngineResult<()> {
    if terms.principal <= Decimal::ZERO {
        return Err(EngineError::InvalidLoanTerms {
            message: format!("principal must be greater than zero (got {})", terms.principal),
        });
    }
    validate_term(terms.term_months)?;
    if terms.interest_rate < Decimal::ZERO {
        return Err(EngineError::InvalidLoanTerms {
            message: format!(
                "interest_rate must not be negative (got {})",
                terms.interest_rate
            ),
        });
    }
    Ok(())
}

/// Monthly interest rate as a fraction, from an annual percentage.
fn monthly_rate(annual_percent: Decimal) -> Decimal {
    annual_percent / Decimal::ONE_HUNDRED / Decimal::from(PAYMENTS_PER_YEAR)
}

/// Computes the level instalment that repays `principal` over `term_months`.
///
/// Uses `P × r × (1+r)^n / ((1+r)^n − 1)`, or `P / n` for an interest-free
/// loan. The result is rounded to cents. Terms longer than
/// [`MAX_TERM_MONTHS`] are rejected.
///
/// # Examples
///
/// ```
/// use bizcalc_engine::calculation::monthly_payment;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let payment = monthly_payment(Decimal::new(12000, 0), Decimal::new(5, 0), 12).unwrap();
/// assert_eq!(payment, Decimal::from_str("1027.29").unwrap());
/// ```
pub fn monthly_payment(
    principal: Decimal,
    annual_interest_rate: Decimal,
    term_months: u32,
) -> EngineResult<Decimal> {
    validate_term(term_months)?;

    let rate = monthly_rate(annual_interest_rate);
    let periods = Decimal::from(term_months);

    if rate.is_zero() {
        return Ok(round_money(principal / periods));
    }

    let growth = Decimal::ONE + rate;
    let mut compound = Decimal::ONE;
    for _ in 0..term_months {
        compound = compound
            .checked_mul(growth)
            .ok_or_else(|| EngineError::overflow("compound factor"))?;
    }

    let payment = principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(compound))
        .and_then(|v| v.checked_div(compound - Decimal::ONE))
        .ok_or_else(|| EngineError::overflow("monthly payment"))?;

    Ok(round_money(payment))
}

/// Generates the full repayment schedule for a loan.
///
/// Instalment `k` (1-based) is due `k` calendar months after the start date,
/// clamped to the end of shorter months. Interest for each period is charged
/// on the remaining balance and rounded to cents; the final instalment
/// repays whatever balance remains so the schedule closes at exactly zero.
///
/// # Errors
///
/// Returns [`EngineError::InvalidLoanTerms`] if the principal is not
/// positive, the term is zero or longer than [`MAX_TERM_MONTHS`], or the
/// rate is negative. Returns [`EngineError::CalculationError`] if an amount
/// overflows.
///
/// # Examples
///
/// ```
/// use bizcalc_engine::calculation::generate_schedule;
/// use bizcalc_engine::models::{LoanTerms, LoanStatus};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let terms = LoanTerms {
///     loan_id: "loan_001".to_string(),
///     borrower_id: "cust_042".to_string(),
///     principal: Decimal::new(12000, 0),
///     interest_rate: Decimal::new(5, 0),
///     term_months: 12,
///     start_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
/// };
///
/// let agreement = generate_schedule(&terms).unwrap();
/// assert_eq!(agreement.payments.len(), 12);
/// assert_eq!(agreement.status, LoanStatus::Active);
/// ```
pub fn generate_schedule(terms: &LoanTerms) -> EngineResult<LoanAgreement> {
    validate_terms(terms)?;

    let rate = monthly_rate(terms.interest_rate);
    let instalment = monthly_payment(terms.principal, terms.interest_rate, terms.term_months)?;

    let mut balance = terms.principal;
    let mut payments = Vec::new();

    for sequence in 1..=terms.term_months {
        let due_date = terms
            .start_date
            .checked_add_months(Months::new(sequence))
            .ok_or_else(|| EngineError::InvalidLoanTerms {
                message: format!(
                    "due date of instalment {} is out of range",
                    sequence
                ),
            })?;

        let interest = round_money(
            balance
                .checked_mul(rate)
                .ok_or_else(|| EngineError::overflow("period interest"))?,
        );

        let principal_portion = if sequence == terms.term_months {
            balance
        } else {
            (instalment - interest).clamp(Decimal::ZERO, balance)
        };
        balance -= principal_portion;
        let amount = principal_portion
            .checked_add(interest)
            .ok_or_else(|| EngineError::overflow("instalment amount"))?;

        payments.push(LoanPayment {
            id: payment_id(&terms.loan_id, sequence),
            sequence,
            amount,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
            due_date,
            status: PaymentStatus::Pending,
            paid_date: None,
        });
    }

    let total_amount = checked_total(payments.iter(), "total amount")?;
    let end_date = payments
        .last()
        .map(|p| p.due_date)
        .unwrap_or(terms.start_date);

    debug!(
        loan_id = %terms.loan_id,
        principal = %terms.principal,
        monthly_payment = %instalment,
        total_amount = %total_amount,
        "Generated amortization schedule"
    );

    Ok(LoanAgreement {
        id: terms.loan_id.clone(),
        borrower_id: terms.borrower_id.clone(),
        principal: terms.principal,
        interest_rate: terms.interest_rate,
        term_months: terms.term_months,
        monthly_payment: instalment,
        total_amount,
        total_interest: total_amount - terms.principal,
        start_date: terms.start_date,
        end_date,
        payments,
        status: LoanStatus::Active,
    })
}

/// Records an instalment as paid and returns the updated agreement.
///
/// Only active agreements take payments. The agreement becomes `Completed`
/// once every instalment is paid.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPaymentState`] if the agreement is not
/// active, no instalment has the given id, or it is already paid. The input
/// agreement is never modified.
pub fn record_payment(
    agreement: &LoanAgreement,
    payment_id: &str,
    paid_on: NaiveDate,
) -> EngineResult<LoanAgreement> {
    if agreement.status != LoanStatus::Active {
        return Err(EngineError::InvalidPaymentState {
            payment_id: payment_id.to_string(),
            message: format!(
                "loan '{}' is {:?} and takes no payments",
                agreement.id, agreement.status
            ),
        });
    }

    let index = agreement
        .payments
        .iter()
        .position(|p| p.id == payment_id)
        .ok_or_else(|| EngineError::InvalidPaymentState {
            payment_id: payment_id.to_string(),
            message: format!("no such payment on loan '{}'", agreement.id),
        })?;

    if agreement.payments[index].is_paid() {
        return Err(EngineError::InvalidPaymentState {
            payment_id: payment_id.to_string(),
            message: "payment is already paid".to_string(),
        });
    }

    let mut updated = agreement.clone();
    let payment = &mut updated.payments[index];
    payment.status = PaymentStatus::Paid;
    payment.paid_date = Some(paid_on);

    if updated.payments.iter().all(LoanPayment::is_paid) {
        updated.status = LoanStatus::Completed;
    }

    debug!(
        loan_id = %updated.id,
        payment_id = %payment_id,
        status = ?updated.status,
        "Recorded loan payment"
    );

    Ok(updated)
}

/// Marks an active agreement as defaulted and returns the updated copy.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPaymentState`] if the agreement is not active.
pub fn mark_defaulted(agreement: &LoanAgreement) -> EngineResult<LoanAgreement> {
    if agreement.status != LoanStatus::Active {
        return Err(EngineError::InvalidPaymentState {
            payment_id: agreement.id.clone(),
            message: format!("cannot default a loan that is {:?}", agreement.status),
        });
    }

    let mut updated = agreement.clone();
    updated.status = LoanStatus::Defaulted;
    Ok(updated)
}

/// Returns the display status of an instalment as of `as_of`.
///
/// An unpaid instalment whose due date is before `as_of` is `Overdue`.
/// This is derived on every read and never stored.
pub fn payment_status(payment: &LoanPayment, as_of: NaiveDate) -> PaymentStatus {
    match payment.status {
        PaymentStatus::Paid => PaymentStatus::Paid,
        _ if payment.due_date < as_of => PaymentStatus::Overdue,
        _ => PaymentStatus::Pending,
    }
}

/// Folds a set of agreements into portfolio totals as of `as_of`.
///
/// Active value, outstanding amount, overdue count and borrowers consider
/// only active agreements; the repaid total covers every agreement. Counts
/// saturate at `u32::MAX`.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if a total overflows.
pub fn summarize_portfolio(
    agreements: &[LoanAgreement],
    as_of: NaiveDate,
) -> EngineResult<LoanPortfolioSummary> {
    let mut total_active_value = Decimal::ZERO;
    let mut total_outstanding = Decimal::ZERO;
    let mut total_repaid = Decimal::ZERO;
    let mut overdue_payments = 0u32;
    let mut active_loans = 0u32;
    let mut borrowers = BTreeSet::new();

    for agreement in agreements {
        total_repaid = add_amount(total_repaid, agreement.amount_repaid()?, "total repaid")?;

        if agreement.status != LoanStatus::Active {
            continue;
        }

        active_loans = active_loans.saturating_add(1);
        borrowers.insert(agreement.borrower_id.as_str());
        total_active_value =
            add_amount(total_active_value, agreement.total_amount, "total active value")?;
        total_outstanding = add_amount(
            total_outstanding,
            agreement.amount_outstanding()?,
            "total outstanding",
        )?;

        let overdue = agreement
            .payments
            .iter()
            .filter(|p| payment_status(p, as_of) == PaymentStatus::Overdue)
            .count();
        overdue_payments = overdue_payments.saturating_add(saturating_count(overdue));
    }

    Ok(LoanPortfolioSummary {
        total_active_value,
        total_outstanding,
        total_repaid,
        overdue_payments,
        active_borrowers: saturating_count(borrowers.len()),
        active_loans,
    })
}

fn add_amount(total: Decimal, amount: Decimal, what: &str) -> EngineResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::overflow(what))
}

fn checked_total<'a>(
    mut payments: impl Iterator<Item = &'a LoanPayment>,
    what: &str,
) -> EngineResult<Decimal> {
    payments.try_fold(Decimal::ZERO, |total, p| add_amount(total, p.amount, what))
}

fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
