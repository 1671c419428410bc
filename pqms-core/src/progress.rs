//! The stability matrix of a protocol and its completion percentage.

use crate::error::PqmsError;
use crate::sample::SampleKey;
use crate::status::{aggregate, SampleStatus};
use pqms_schemas::stability::{StabilityCondition, StabilityProtocol, StabilityTimePoint};
use pqms_schemas::testing::TestResult;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

/// Completion of a `conditions × time_points` matrix given the cell statuses.
///
/// Only `Completed` cells count; a failed cell is finished but not complete.
pub fn roll_up<'a, I>(statuses: I, conditions: usize, time_points: usize) -> Progress
where
    I: IntoIterator<Item = &'a SampleStatus>,
{
    let completed = statuses
        .into_iter()
        .filter(|s| **s == SampleStatus::Completed)
        .count();
    let total = conditions * time_points;
    let percent = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };
    Progress {
        completed,
        total,
        percent,
    }
}

#[derive(Debug, Serialize)]
struct MatrixRow<'a> {
    condition: &'a str,
    time_point: &'a str,
    month: u32,
    sample_key: &'a str,
    status: &'static str,
    result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub condition_id: String,
    pub time_point_id: String,
    pub sample_key: String,
    pub status: SampleStatus,
    pub result_count: usize,
}

/// Cell statuses of a protocol, one row per storage condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityMatrix {
    pub protocol_number: String,
    pub conditions: Vec<StabilityCondition>,
    /// Sorted by month.
    pub time_points: Vec<StabilityTimePoint>,
    pub rows: Vec<Vec<MatrixCell>>,
}

impl StabilityMatrix {
    pub fn build(protocol: &StabilityProtocol, results: &[TestResult]) -> Self {
        let mut time_points = protocol.time_points.clone();
        time_points.sort_by_key(|tp| tp.month);

        let rows = protocol
            .storage_conditions
            .iter()
            .map(|condition| {
                time_points
                    .iter()
                    .map(|tp| {
                        let key = SampleKey::new(&protocol.protocol_number, &condition.id, &tp.id);
                        let sample_results: Vec<&TestResult> =
                            results.iter().filter(|r| r.sample_id == key.as_str()).collect();
                        MatrixCell {
                            condition_id: condition.id.clone(),
                            time_point_id: tp.id.clone(),
                            status: aggregate(&sample_results, &protocol.tests),
                            result_count: sample_results.len(),
                            sample_key: key.into(),
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            protocol_number: protocol.protocol_number.clone(),
            conditions: protocol.storage_conditions.clone(),
            time_points,
            rows,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &MatrixCell> {
        self.rows.iter().flatten()
    }

    pub fn cell(&self, condition_id: &str, time_point_id: &str) -> Option<&MatrixCell> {
        self.cells()
            .find(|c| c.condition_id == condition_id && c.time_point_id == time_point_id)
    }

    pub fn progress(&self) -> Progress {
        roll_up(
            self.cells().map(|c| &c.status),
            self.conditions.len(),
            self.time_points.len(),
        )
    }

    /// Flattens the matrix into one CSV row per sample.
    pub fn write_csv(&self, path: &Path) -> Result<(), PqmsError> {
        let name = path.display().to_string();
        let mut writer = csv::Writer::from_path(path).map_err(|e| PqmsError::CsvError(name.clone(), e))?;
        for (condition, row) in self.conditions.iter().zip(&self.rows) {
            for (time_point, cell) in self.time_points.iter().zip(row) {
                writer
                    .serialize(MatrixRow {
                        condition: &condition.condition,
                        time_point: &time_point.label,
                        month: time_point.month,
                        sample_key: &cell.sample_key,
                        status: cell.status.label(),
                        result_count: cell.result_count,
                    })
                    .map_err(|e| PqmsError::CsvError(name.clone(), e))?;
            }
        }
        writer.flush().map_err(|e| PqmsError::FileIO(name, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pqms_schemas::stability::{StabilityStatus, StudyType};
    use pqms_schemas::testing::{OverallResult, TestStatus};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn protocol(conditions: usize, time_points: &[u32]) -> StabilityProtocol {
        StabilityProtocol {
            id: "sp1".to_string(),
            protocol_number: "STB-001".to_string(),
            product_id: "p1".to_string(),
            product_name: "Paracetamol 500mg".to_string(),
            batch_number: "B001".to_string(),
            study_type: StudyType::LongTerm,
            storage_conditions: (1..=conditions)
                .map(|i| StabilityCondition {
                    id: format!("C{}", i),
                    condition: format!("condition {}", i),
                    zone: "II".to_string(),
                })
                .collect(),
            time_points: time_points
                .iter()
                .map(|m| StabilityTimePoint {
                    id: format!("T{}", m),
                    label: format!("{}M", m),
                    month: *m,
                    scheduled_date: date(),
                    window_days: 7,
                })
                .collect(),
            tests: vec!["M1".to_string()],
            packaging_type: String::new(),
            sample_quantity: 0,
            initiation_date: date(),
            status: StabilityStatus::Active,
            approved_by: None,
        }
    }

    fn completed(key: &str) -> TestResult {
        TestResult {
            id: format!("r-{}", key),
            product_id: "p1".to_string(),
            test_method_id: "M1".to_string(),
            batch_number: "B001".to_string(),
            sample_id: key.to_string(),
            analyst_id: "a".to_string(),
            test_date: date(),
            completion_date: None,
            parameters: vec![],
            overall_result: OverallResult::Pass,
            status: TestStatus::Completed,
            notes: None,
        }
    }

    #[test]
    fn half_complete_matrix() {
        let protocol = protocol(3, &[0, 3, 6, 12]);
        let results: Vec<TestResult> = ["C1-T0", "C1-T3", "C1-T6", "C2-T0", "C2-T3", "C3-T0"]
            .iter()
            .map(|cell| completed(&format!("STB-001-{}", cell)))
            .collect();

        let matrix = StabilityMatrix::build(&protocol, &results);
        assert_eq!(
            matrix.progress(),
            Progress {
                completed: 6,
                total: 12,
                percent: 50
            }
        );
        assert_eq!(matrix.cell("C3", "T12").map(|c| c.status), Some(SampleStatus::Pending));
        assert_eq!(matrix.cell("C2", "T3").map(|c| c.status), Some(SampleStatus::Completed));
    }

    #[test]
    fn time_points_are_ordered_by_month() {
        let matrix = StabilityMatrix::build(&protocol(1, &[12, 0, 6]), &[]);
        let months: Vec<u32> = matrix.time_points.iter().map(|tp| tp.month).collect();
        assert_eq!(months, vec![0, 6, 12]);
        assert_eq!(matrix.rows[0][0].sample_key, "STB-001-C1-T0");
    }

    #[test]
    fn csv_has_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let results = vec![completed("STB-001-C2-T0")];
        StabilityMatrix::build(&protocol(2, &[3, 0]), &results).write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(&reader.headers().unwrap()[3], "sample_key");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][1], "0M");
        assert_eq!(&rows[0][3], "STB-001-C1-T0");
        assert_eq!(&rows[2][4], "Completed");
        assert_eq!(&rows[2][5], "1");
        assert_eq!(&rows[3][4], "Pending");
    }

    #[test]
    fn empty_matrix_is_zero_percent() {
        let matrix = StabilityMatrix::build(&protocol(0, &[]), &[]);
        assert_eq!(matrix.progress().percent, 0);
        assert_eq!(roll_up(std::iter::empty(), 0, 4).percent, 0);
    }

    #[test]
    fn rounding() {
        let statuses = [SampleStatus::Completed, SampleStatus::Fail, SampleStatus::Pending];
        assert_eq!(roll_up(&statuses, 1, 3).percent, 33);
        assert_eq!(roll_up(&statuses[..1], 1, 3).percent, 33);
        assert_eq!(roll_up(&[SampleStatus::Completed; 2], 1, 3).percent, 67);
    }
}
