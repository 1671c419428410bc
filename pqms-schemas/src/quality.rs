//! CAPA, deviation and audit records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapaSource {
    #[serde(rename = "OOS")]
    Oos,
    #[serde(rename = "OOT")]
    Oot,
    Deviation,
    Audit,
    Complaint,
    #[serde(rename = "Risk_Assessment")]
    RiskAssessment,
    #[serde(rename = "Management_Review")]
    ManagementReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapaStatus {
    Open,
    #[serde(rename = "In_Progress")]
    InProgress,
    #[serde(rename = "Pending_Verification")]
    PendingVerification,
    Closed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    #[serde(rename = "Not_Started")]
    NotStarted,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapaAction {
    pub id: String,
    pub description: String,
    pub assigned_to: String,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    pub status: ActionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capa {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: CapaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub corrective_actions: Vec<CapaAction>,
    #[serde(default)]
    pub preventive_actions: Vec<CapaAction>,
    pub initiated_by: String,
    pub initiation_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    pub status: CapaStatus,
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviationType {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviationStatus {
    Open,
    #[serde(rename = "Under_Investigation")]
    UnderInvestigation,
    #[serde(rename = "Pending_CAPA")]
    PendingCapa,
    #[serde(rename = "Pending_Approval")]
    PendingApproval,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub deviation_type: DeviationType,
    pub discovered_by: String,
    pub discovery_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_batch: Option<String>,
    #[serde(default)]
    pub immediate_action: String,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub capa_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capa_id: Option<String>,
    pub status: DeviationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditType {
    Internal,
    External,
    Regulatory,
    Supplier,
    Certification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Planned,
    #[serde(rename = "In_Progress")]
    InProgress,
    #[serde(rename = "Pending_Report")]
    PendingReport,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingCategory {
    Critical,
    Major,
    Minor,
    Observation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFinding {
    pub id: String,
    pub category: FindingCategory,
    pub description: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capa_id: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: String,
    pub audit_number: String,
    #[serde(rename = "type")]
    pub audit_type: AuditType,
    pub scope: String,
    #[serde(default)]
    pub auditors: Vec<String>,
    pub scheduled_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub findings: Vec<AuditFinding>,
    pub status: AuditStatus,
}
