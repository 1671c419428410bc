//! Laboratory test methods and the results recorded against them.
//!
//! A `TestResult` is created when an operator starts a test against a sample,
//! mutated while parameter values are entered, and frozen once it is
//! `Completed`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestCategory {
    Identity,
    Assay,
    Dissolution,
    Uniformity,
    Impurities,
    Microbial,
    Physical,
    Chemical,
    Biological,
    Stability,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodStatus {
    Active,
    Inactive,
}

/// A single measured or observed quantity of a test method, with its limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestParameter {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_value: Option<f64>,
    #[serde(default)]
    pub is_qualitative: bool,
    /// The first option is the passing one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualitative_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMethod {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: TestCategory,
    #[serde(default)]
    pub parameters: Vec<TestParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacopeia_reference: Option<String>,
    #[serde(default)]
    pub standard_procedure: String,
    pub status: MethodStatus,
}

/// Verdict of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterVerdict {
    Pass,
    Fail,
    Pending,
}

/// Overall verdict of a test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallResult {
    Pending,
    Pass,
    Fail,
    #[serde(rename = "OOS")]
    Oos,
}

impl fmt::Display for OverallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverallResult::Pending => "Pending",
            OverallResult::Pass => "Pass",
            OverallResult::Fail => "Fail",
            OverallResult::Oos => "OOS",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    Scheduled,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Approved,
    Rejected,
}

/// Values are entered free-form; numbers stay numbers, everything else is text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

impl ParameterValue {
    /// Numeric reading of the value, if any. Text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(n) if n.is_finite() => Some(*n),
            ParameterValue::Number(_) => None,
            ParameterValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, ParameterValue::Text(s) if s.trim().is_empty())
    }
}

impl Default for ParameterValue {
    fn default() -> Self {
        ParameterValue::Text(String::new())
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(n) => write!(f, "{}", n),
            ParameterValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterResult {
    pub parameter_id: String,
    pub parameter_name: String,
    #[serde(default)]
    pub value: ParameterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub result: ParameterVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub product_id: String,
    pub test_method_id: String,
    pub batch_number: String,
    /// Composite sample key; for stability samples see `pqms_core::sample`.
    pub sample_id: String,
    pub analyst_id: String,
    pub test_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parameters: Vec<ParameterResult>,
    pub overall_result: OverallResult,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
