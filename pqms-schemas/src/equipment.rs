use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentStatus {
    Active,
    Inactive,
    #[serde(rename = "Under_Maintenance")]
    UnderMaintenance,
    #[serde(rename = "Out_Of_Service")]
    OutOfService,
    Retired,
}

/// Installation, operational and performance qualification flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    pub iq: bool,
    pub oq: bool,
    pub pq: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationSchedule {
    /// In days.
    pub frequency: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_calibration: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_calibration: Option<NaiveDate>,
    #[serde(default)]
    pub calibration_procedure: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub qualification_status: Qualification,
    pub calibration_schedule: CalibrationSchedule,
    pub status: EquipmentStatus,
}
