use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "Product_Created")]
    ProductCreated,
    #[serde(rename = "Product_Updated")]
    ProductUpdated,
    #[serde(rename = "Record_Created")]
    RecordCreated,
    #[serde(rename = "Record_Updated")]
    RecordUpdated,
    #[serde(rename = "Record_Deleted")]
    RecordDeleted,
    #[serde(rename = "Test_Started")]
    TestStarted,
    #[serde(rename = "Test_Completed")]
    TestCompleted,
    #[serde(rename = "OOS_Investigation")]
    OosInvestigation,
    #[serde(rename = "Batch_Issued")]
    BatchIssued,
    #[serde(rename = "Batch_Updated")]
    BatchUpdated,
    #[serde(rename = "Batch_Quarantined")]
    BatchQuarantined,
    #[serde(rename = "Batch_Released")]
    BatchReleased,
    #[serde(rename = "Batch_Rejected")]
    BatchRejected,
}

/// An entry of the activity feed, derived from a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
}
