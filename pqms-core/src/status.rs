//! Derived verdicts: the status of a stability sample folded from its test
//! results, and the pass/fail classification of individual parameters.

use crate::sample::results_for_sample;
use pqms_schemas::testing::{
    OverallResult, ParameterResult, ParameterValue, ParameterVerdict, TestParameter, TestResult,
    TestStatus,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleStatus {
    Pending,
    Scheduled,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Fail,
    #[serde(rename = "OOS")]
    Oos,
}

/// What the matrix cell offers the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    Start,
    View,
}

impl SampleStatus {
    pub fn action(&self) -> CellAction {
        match self {
            SampleStatus::Pending | SampleStatus::Scheduled | SampleStatus::InProgress => {
                CellAction::Start
            }
            SampleStatus::Completed | SampleStatus::Fail | SampleStatus::Oos => CellAction::View,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "Pending",
            SampleStatus::Scheduled => "Scheduled",
            SampleStatus::InProgress => "In Progress",
            SampleStatus::Completed => "Completed",
            SampleStatus::Fail => "Fail",
            SampleStatus::Oos => "OOS",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Folds every result recorded against `sample_key` into one status.
///
/// Precedence, first match wins: no results, any OOS, all required tests
/// completed (Fail if any of those failed), any in progress, scheduled.
/// A Fail is only surfaced once every required test is completed.
pub fn aggregate_sample_status(
    results: &[TestResult],
    sample_key: &str,
    required_test_ids: &[String],
) -> SampleStatus {
    let sample_results = results_for_sample(results, sample_key);
    aggregate(&sample_results, required_test_ids)
}

pub(crate) fn aggregate(sample_results: &[&TestResult], required_test_ids: &[String]) -> SampleStatus {
    if sample_results.is_empty() {
        return SampleStatus::Pending;
    }
    if sample_results.iter().any(|r| r.overall_result == OverallResult::Oos) {
        return SampleStatus::Oos;
    }

    let completed: Vec<&&TestResult> = sample_results
        .iter()
        .filter(|r| required_test_ids.contains(&r.test_method_id) && r.status == TestStatus::Completed)
        .collect();

    if !required_test_ids.is_empty() && completed.len() >= required_test_ids.len() {
        if completed.iter().any(|r| r.overall_result == OverallResult::Fail) {
            return SampleStatus::Fail;
        }
        return SampleStatus::Completed;
    }

    if sample_results.iter().any(|r| r.status == TestStatus::InProgress) {
        return SampleStatus::InProgress;
    }

    SampleStatus::Scheduled
}

/// Checks an entered value against the parameter's limits.
pub fn evaluate_parameter(parameter: &TestParameter, value: &ParameterValue) -> ParameterVerdict {
    if parameter.is_qualitative {
        let entered = value.to_string();
        return match parameter.qualitative_options.first() {
            Some(passing) if *passing == entered => ParameterVerdict::Pass,
            _ => ParameterVerdict::Fail,
        };
    }

    let Some(number) = value.as_number() else {
        return ParameterVerdict::Pending;
    };

    if parameter.min_value.is_some_and(|min| number < min) {
        ParameterVerdict::Fail
    } else if parameter.max_value.is_some_and(|max| number > max) {
        ParameterVerdict::Fail
    } else if parameter.min_value.is_some() || parameter.max_value.is_some() {
        ParameterVerdict::Pass
    } else {
        ParameterVerdict::Pending
    }
}

/// Any failed parameter makes the whole result out of specification.
pub fn classify_overall(parameters: &[ParameterResult]) -> OverallResult {
    if parameters.is_empty() {
        return OverallResult::Pending;
    }
    if parameters.iter().any(|p| p.result == ParameterVerdict::Fail) {
        return OverallResult::Oos;
    }
    if parameters.iter().all(|p| p.result == ParameterVerdict::Pass) {
        return OverallResult::Pass;
    }
    OverallResult::Pending
}
