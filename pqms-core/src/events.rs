use pqms_schemas::activity::ActivityType;
use pqms_schemas::batch::BatchStatus;
use pqms_schemas::command::SignatureRole;
use pqms_schemas::ipqc::CheckStatus;
use pqms_schemas::record::Table;
use pqms_schemas::testing::OverallResult;
use serde::{Deserialize, Serialize};

/// What a command changed, in the order it changed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    RecordCreated {
        table: Table,
        id: String,
    },
    RecordUpdated {
        table: Table,
        id: String,
    },
    RecordDeleted {
        table: Table,
        id: String,
    },
    TestStarted {
        result_id: String,
        sample_id: String,
        test_method: String,
    },
    TestCompleted {
        result_id: String,
        sample_id: String,
        test_method: String,
        overall: OverallResult,
    },
    OosDetected {
        result_id: String,
        sample_id: String,
        test_method: String,
    },
    IpqcCheckRecorded {
        check_id: String,
        batch_number: String,
        check_type: String,
        result: String,
        status: CheckStatus,
    },
    BatchIssued {
        batch_id: String,
        batch_number: String,
        product_name: String,
    },
    StepSigned {
        batch_id: String,
        step_number: u32,
        role: SignatureRole,
        signer: String,
    },
    MaterialVerified {
        batch_id: String,
        item_code: String,
        actual_qty: f64,
    },
    YieldRecorded {
        batch_id: String,
        batch_number: String,
        percentage: String,
    },
    BatchStatusChanged {
        batch_id: String,
        batch_number: String,
        status: BatchStatus,
    },
    DataRestored {
        tables: usize,
        records: usize,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::RecordCreated { .. } => "record_created",
            DomainEvent::RecordUpdated { .. } => "record_updated",
            DomainEvent::RecordDeleted { .. } => "record_deleted",
            DomainEvent::TestStarted { .. } => "test_started",
            DomainEvent::TestCompleted { .. } => "test_completed",
            DomainEvent::OosDetected { .. } => "oos_detected",
            DomainEvent::IpqcCheckRecorded { .. } => "ipqc_check_recorded",
            DomainEvent::BatchIssued { .. } => "batch_issued",
            DomainEvent::StepSigned { .. } => "step_signed",
            DomainEvent::MaterialVerified { .. } => "material_verified",
            DomainEvent::YieldRecorded { .. } => "yield_recorded",
            DomainEvent::BatchStatusChanged { .. } => "batch_status_changed",
            DomainEvent::DataRestored { .. } => "data_restored",
        }
    }

    /// The activity feed entry type, if the event belongs in the feed.
    ///
    /// A restore replaces the feed itself and is therefore not added to it.
    pub fn activity_type(&self) -> Option<ActivityType> {
        let kind = match self {
            DomainEvent::RecordCreated { table: Table::Products, .. } => ActivityType::ProductCreated,
            DomainEvent::RecordUpdated { table: Table::Products, .. } => ActivityType::ProductUpdated,
            DomainEvent::RecordCreated { .. } | DomainEvent::IpqcCheckRecorded { .. } => {
                ActivityType::RecordCreated
            }
            DomainEvent::RecordUpdated { .. } => ActivityType::RecordUpdated,
            DomainEvent::RecordDeleted { .. } => ActivityType::RecordDeleted,
            DomainEvent::TestStarted { .. } => ActivityType::TestStarted,
            DomainEvent::TestCompleted { .. } => ActivityType::TestCompleted,
            DomainEvent::OosDetected { .. } => ActivityType::OosInvestigation,
            DomainEvent::BatchIssued { .. } => ActivityType::BatchIssued,
            DomainEvent::StepSigned { .. }
            | DomainEvent::MaterialVerified { .. }
            | DomainEvent::YieldRecorded { .. } => ActivityType::BatchUpdated,
            DomainEvent::BatchStatusChanged { status, .. } => match status {
                BatchStatus::Quarantine => ActivityType::BatchQuarantined,
                BatchStatus::Released => ActivityType::BatchReleased,
                BatchStatus::Rejected => ActivityType::BatchRejected,
                BatchStatus::Issuance | BatchStatus::Manufacturing => ActivityType::BatchUpdated,
            },
            DomainEvent::DataRestored { .. } => return None,
        };
        Some(kind)
    }

    pub fn related_id(&self) -> Option<&str> {
        match self {
            DomainEvent::RecordCreated { id, .. }
            | DomainEvent::RecordUpdated { id, .. }
            | DomainEvent::RecordDeleted { id, .. } => Some(id),
            DomainEvent::TestStarted { result_id, .. }
            | DomainEvent::TestCompleted { result_id, .. }
            | DomainEvent::OosDetected { result_id, .. } => Some(result_id),
            DomainEvent::IpqcCheckRecorded { check_id, .. } => Some(check_id),
            DomainEvent::BatchIssued { batch_id, .. }
            | DomainEvent::StepSigned { batch_id, .. }
            | DomainEvent::MaterialVerified { batch_id, .. }
            | DomainEvent::YieldRecorded { batch_id, .. }
            | DomainEvent::BatchStatusChanged { batch_id, .. } => Some(batch_id),
            DomainEvent::DataRestored { .. } => None,
        }
    }

    pub fn description(&self) -> String {
        match self {
            DomainEvent::RecordCreated { table, id } => format!("Created {} record {}", table, id),
            DomainEvent::RecordUpdated { table, id } => format!("Updated {} record {}", table, id),
            DomainEvent::RecordDeleted { table, id } => format!("Deleted {} record {}", table, id),
            DomainEvent::TestStarted { sample_id, test_method, .. } => {
                format!("Started {} for sample {}", test_method, sample_id)
            }
            DomainEvent::TestCompleted { sample_id, test_method, overall, .. } => {
                format!("Completed {} for sample {}: {}", test_method, sample_id, overall)
            }
            DomainEvent::OosDetected { sample_id, test_method, .. } => {
                format!("OOS result in {} for sample {}, investigation required", test_method, sample_id)
            }
            DomainEvent::IpqcCheckRecorded { batch_number, check_type, result, status, .. } => {
                format!("IPQC {} on batch {}: {} ({:?})", check_type, batch_number, result, status)
            }
            DomainEvent::BatchIssued { batch_number, product_name, .. } => {
                format!("Issued batch record {} for {}", batch_number, product_name)
            }
            DomainEvent::StepSigned { step_number, role, signer, .. } => {
                format!("Step {} signed by {} ({:?})", step_number, signer, role)
            }
            DomainEvent::MaterialVerified { item_code, actual_qty, .. } => {
                format!("Verified material {}: {}", item_code, actual_qty)
            }
            DomainEvent::YieldRecorded { batch_number, percentage, .. } => {
                format!("Recorded actual yield {} for batch {}", percentage, batch_number)
            }
            DomainEvent::BatchStatusChanged { batch_number, status, .. } => {
                format!("Batch {} moved to {}", batch_number, status)
            }
            DomainEvent::DataRestored { tables, records } => {
                format!("Restored {} records across {} tables", records, tables)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_records_get_product_activity() {
        let created = DomainEvent::RecordCreated {
            table: Table::Products,
            id: "p1".to_string(),
        };
        assert_eq!(created.activity_type(), Some(ActivityType::ProductCreated));

        let capa = DomainEvent::RecordCreated {
            table: Table::Capas,
            id: "c1".to_string(),
        };
        assert_eq!(capa.activity_type(), Some(ActivityType::RecordCreated));
        assert_eq!(capa.description(), "Created capas record c1");
    }

    #[test]
    fn batch_status_maps_to_lifecycle_activity() {
        let event = DomainEvent::BatchStatusChanged {
            batch_id: "b1".to_string(),
            batch_number: "B-001".to_string(),
            status: BatchStatus::Quarantine,
        };
        assert_eq!(event.activity_type(), Some(ActivityType::BatchQuarantined));
        assert_eq!(event.related_id(), Some("b1"));
        assert_eq!(event.description(), "Batch B-001 moved to Quarantine");
    }

    #[test]
    fn restore_is_not_fed_back_into_the_activity_table() {
        let event = DomainEvent::DataRestored { tables: 3, records: 10 };
        assert_eq!(event.activity_type(), None);
        assert_eq!(event.name(), "data_restored");
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = DomainEvent::OosDetected {
            result_id: "r1".to_string(),
            sample_id: "S-C1-T1".to_string(),
            test_method: "Assay".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "oos_detected");
        assert_eq!(json["result_id"], "r1");
    }
}
