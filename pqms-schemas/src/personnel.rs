//! Training records and approved suppliers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingType {
    Onboarding,
    #[serde(rename = "SOP")]
    Sop,
    Technical,
    Safety,
    Quality,
    Regulatory,
    Refresher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    Scheduled,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecord {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default)]
    pub department: String,
    pub training_title: String,
    pub training_type: TrainingType,
    pub training_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub status: TrainingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub competency_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierType {
    #[serde(rename = "API")]
    Api,
    Excipient,
    Packaging,
    Equipment,
    Service,
    Laboratory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierQualification {
    Approved,
    Conditional,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub supplier_type: SupplierType,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub products: Vec<String>,
    pub qualification_status: SupplierQualification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_audit_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub status: SupplierStatus,
}
