//! Master formula records (MFR) and the batch manufacturing records (BMR)
//! executed from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngredientCategory {
    #[serde(rename = "API")]
    Api,
    Excipient,
    Packaging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub item_code: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub category: IngredientCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Manufacturing,
    Packaging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConditions {
    pub temp: String,
    pub humidity: String,
}

/// An approved process step of a master formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
    pub step_number: u32,
    pub phase: Phase,
    #[serde(default)]
    pub department: String,
    pub description: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub critical_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_conditions: Option<RoomConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
    #[serde(default)]
    pub role_required: String,
}

/// Acceptable actual yield, in percent of the batch size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaStatus {
    Draft,
    Approved,
    Closed,
}

/// The approved template (ingredients and process steps) a batch record instantiates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterFormula {
    pub id: String,
    pub product_name: String,
    pub mfr_number: String,
    #[serde(default)]
    pub revision_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    pub batch_size: f64,
    pub batch_size_unit: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub dosage_form: String,
    #[serde(default)]
    pub shelf_life: String,
    pub theoretical_yield_range: YieldRange,
    #[serde(default)]
    pub line_clearance_required: bool,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub process_steps: Vec<ProcessStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FormulaStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    #[serde(rename = "In-Progress")]
    InProgress,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub step_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_signature: Option<String>,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialVerification {
    pub item_code: String,
    pub actual_qty: f64,
    pub verified_by: String,
    pub verified_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    Issuance,
    Manufacturing,
    Quarantine,
    Released,
    Rejected,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub id: String,
    pub batch_number: String,
    pub mfr_id: String,
    pub product_name: String,
    pub batch_size: f64,
    pub batch_size_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfg_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub status: BatchStatus,
    pub issuance_date: NaiveDate,
    pub issued_by: String,
    #[serde(default)]
    pub step_executions: Vec<StepExecution>,
    #[serde(default)]
    pub material_verifications: Vec<MaterialVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_yield: Option<f64>,
}
