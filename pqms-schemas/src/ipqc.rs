use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpqcDosageForm {
    Tablet,
    Liquid,
    Powder,
    Capsule,
}

impl fmt::Display for IpqcDosageForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManufacturingStage {
    Dispensing,
    Mixing,
    Granulation,
    Drying,
    Sifting,
    Compression,
    Coating,
    Packaging,
    Filling,
    Sealing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    Pass,
    Fail,
    Pending,
}

/// One completed in-process measurement event. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpqcCheck {
    pub id: String,
    pub batch_number: String,
    pub product_name: String,
    pub dosage_form: IpqcDosageForm,
    pub stage: ManufacturingStage,
    /// Name of the test in the IPQC catalog, e.g. "Hausner Ratio".
    pub check_type: String,
    pub parameter: String,
    pub specification: String,
    /// Formatted result as printed on the batch summary.
    pub result: String,
    #[serde(default)]
    pub samples: Vec<f64>,
    pub status: CheckStatus,
    pub checked_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
