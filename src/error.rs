//! Error types for the calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions the payroll, loan and forecasting engines report.

use thiserror::Error;

/// The main error type for the calculation engine.
///
/// All fallible operations in the engine return this error type. None of the
/// variants are transient: they describe caller misuse or bad configuration,
/// so nothing in the crate retries on them.
///
/// # Example
///
/// ```
/// use bizcalc_engine::error::EngineError;
///
/// let error = EngineError::InvalidLoanTerms {
///     message: "principal must be greater than zero".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid loan terms: principal must be greater than zero"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// An input amount or quantity was outside its allowed range.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// Loan terms could not be amortized (non-positive principal or term, negative rate).
    #[error("Invalid loan terms: {message}")]
    InvalidLoanTerms {
        /// A description of the rejected term.
        message: String,
    },

    /// A payment transition was requested that the payment's state does not allow.
    #[error("Invalid payment state for '{payment_id}': {message}")]
    InvalidPaymentState {
        /// The payment (or agreement) identifier the transition targeted.
        payment_id: String,
        /// A description of the rejected transition.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but its values are inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the inconsistency.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for an [`EngineError::InvalidInput`] on `field`.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a decimal overflow during `operation`.
    pub fn overflow(operation: &str) -> Self {
        EngineError::CalculationError {
            message: format!("decimal overflow while computing {}", operation),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_displays_field_and_message() {
        let error = EngineError::InvalidInput {
            field: "basic_salary".to_string(),
            message: "must not be negative".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid input field 'basic_salary': must not be negative"
        );
    }

    #[test]
    fn test_invalid_loan_terms_displays_message() {
        let error = EngineError::InvalidLoanTerms {
            message: "term_months must be greater than zero".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid loan terms: term_months must be greater than zero"
        );
    }

    #[test]
    fn test_invalid_payment_state_displays_id_and_message() {
        let error = EngineError::InvalidPaymentState {
            payment_id: "loan_001-003".to_string(),
            message: "payment is already paid".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid payment state for 'loan_001-003': payment is already paid"
        );
    }

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/payroll.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/payroll.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_config_displays_message() {
        let error = EngineError::InvalidConfig {
            message: "tax schedule has no brackets".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration: tax schedule has no brackets"
        );
    }

    #[test]
    fn test_invalid_input_shorthand() {
        let error = EngineError::invalid_input("bonuses", "must not be negative");
        match error {
            EngineError::InvalidInput { field, message } => {
                assert_eq!(field, "bonuses");
                assert_eq!(message, "must not be negative");
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_overflow_shorthand_mentions_operation() {
        let error = EngineError::overflow("compound factor");
        assert_eq!(
            error.to_string(),
            "Calculation error: decimal overflow while computing compound factor"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_invalid_terms() -> EngineResult<()> {
            Err(EngineError::InvalidLoanTerms {
                message: "test".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_invalid_terms()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
