use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintType {
    Quality,
    Safety,
    Efficacy,
    Packaging,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Open,
    #[serde(rename = "Under_Investigation")]
    UnderInvestigation,
    Responded,
    Closed,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketComplaint {
    pub id: String,
    pub complaint_number: String,
    pub received_date: NaiveDate,
    pub complainant_name: String,
    pub product_name: String,
    pub batch_number: String,
    pub complaint_type: ComplaintType,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub sample_received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub capa_required: bool,
    #[serde(default)]
    pub disposition: String,
    pub status: ComplaintStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecallClass {
    #[serde(rename = "Class_I")]
    ClassI,
    #[serde(rename = "Class_II")]
    ClassII,
    #[serde(rename = "Class_III")]
    ClassIII,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecallStatus {
    Draft,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Terminated,
    #[serde(rename = "Follow_Up")]
    FollowUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecall {
    pub id: String,
    pub recall_number: String,
    pub initiation_date: NaiveDate,
    pub product_name: String,
    #[serde(default)]
    pub batch_numbers: Vec<String>,
    pub recall_classification: RecallClass,
    pub reason_for_recall: String,
    #[serde(default)]
    pub total_quantity_distributed: f64,
    #[serde(default)]
    pub total_quantity_recovered: f64,
    #[serde(default)]
    pub regulatory_notified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_date: Option<NaiveDate>,
    pub status: RecallStatus,
}
