//! Audit trail models.
//!
//! Payroll and tax calculations record every rule they apply as an
//! [`AuditStep`] so a payslip can be explained line by line.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
///
/// # Example
///
/// ```
/// use bizcalc_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "benefits".to_string(),
///     rule_name: "Employer Benefits".to_string(),
///     input: serde_json::json!({"basic_salary": "4000"}),
///     output: serde_json::json!({"benefits": "480"}),
///     reasoning: "$4000 x 0.12 = $480".to_string(),
/// };
/// assert_eq!(step.rule_id, "benefits");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}
