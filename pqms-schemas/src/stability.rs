use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyType {
    #[serde(rename = "Long_Term")]
    LongTerm,
    Accelerated,
    Intermediate,
    #[serde(rename = "Photo_Stability")]
    PhotoStability,
    #[serde(rename = "In_Use")]
    InUse,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityStatus {
    Draft,
    #[serde(rename = "Pending_Approval")]
    PendingApproval,
    Active,
    Completed,
    Terminated,
}

/// A storage condition row of the stability matrix, e.g. "25°C ± 2°C / 60% RH ± 5% RH".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityCondition {
    pub id: String,
    pub condition: String,
    pub zone: String,
}

/// A pull point column of the stability matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityTimePoint {
    pub id: String,
    pub label: String,
    pub month: u32,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub window_days: u32,
}

/// Defines the matrix `storage_conditions × time_points` and the test methods
/// every sample of the matrix must pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityProtocol {
    pub id: String,
    pub protocol_number: String,
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub batch_number: String,
    pub study_type: StudyType,
    #[serde(default)]
    pub storage_conditions: Vec<StabilityCondition>,
    #[serde(default)]
    pub time_points: Vec<StabilityTimePoint>,
    /// Required test method ids.
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub packaging_type: String,
    #[serde(default)]
    pub sample_quantity: u32,
    pub initiation_date: NaiveDate,
    pub status: StabilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}
