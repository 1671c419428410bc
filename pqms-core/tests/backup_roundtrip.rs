use chrono::{NaiveDate, TimeZone, Utc};
use pqms_core::backup::{read_backup_file, write_backup_file};
use pqms_core::error::ValidationError;
use pqms_core::events::DomainEvent;
use pqms_core::store::read_command_file;
use pqms_core::{AppState, PqmsError, StoreBuilder};
use pqms_schemas::batch::MasterFormula;
use pqms_schemas::command::{Command, SignatureRole};
use pqms_schemas::equipment::Equipment;
use pqms_schemas::ipqc::{CheckStatus, IpqcCheck, IpqcDosageForm, ManufacturingStage};
use pqms_schemas::quality::Capa;
use pqms_schemas::record::{Record, Table};
use pqms_schemas::stability::StabilityProtocol;
use pqms_schemas::testing::{ParameterValue, TestMethod};
use serde_json::json;
use std::fs;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
}

fn assay_method() -> TestMethod {
    serde_json::from_value(json!({
        "id": "tm-assay",
        "name": "Assay (HPLC)",
        "category": "Assay",
        "status": "Active",
        "parameters": [
            { "id": "p-assay", "name": "Assay", "unit": "%", "minValue": 95.0, "maxValue": 105.0 },
            { "id": "p-appearance", "name": "Appearance", "isQualitative": true,
              "qualitativeOptions": ["Complies", "Does not comply"] }
        ]
    }))
    .unwrap()
}

fn protocol() -> StabilityProtocol {
    serde_json::from_value(json!({
        "id": "sp-1",
        "protocolNumber": "STB-2025-001",
        "productId": "prod-1",
        "batchNumber": "PCM-001",
        "studyType": "Long_Term",
        "storageConditions": [ { "id": "C1", "condition": "25°C/60% RH", "zone": "II" } ],
        "timePoints": [ { "id": "T0", "label": "Initial", "month": 0, "scheduledDate": "2025-01-10" } ],
        "tests": ["tm-assay"],
        "initiationDate": "2025-01-10",
        "status": "Active"
    }))
    .unwrap()
}

fn mfr() -> MasterFormula {
    serde_json::from_value(json!({
        "id": "mfr-1",
        "productName": "Paracetamol 500mg Tablets",
        "mfrNumber": "MFR-PCM-01",
        "batchSize": 1000.0,
        "batchSizeUnit": "Tablets",
        "theoreticalYieldRange": { "min": 98.0, "max": 101.0 },
        "processSteps": [
            { "stepNumber": 1, "phase": "Manufacturing", "description": "Dispensing" },
            { "stepNumber": 2, "phase": "Packaging", "description": "Blistering" }
        ]
    }))
    .unwrap()
}

fn capa() -> Capa {
    serde_json::from_value(json!({
        "id": "capa-1",
        "title": "Tablet hardness drift",
        "description": "Hardness trending low on line 2",
        "source": "Deviation",
        "priority": "High",
        "initiatedBy": "QA",
        "initiationDate": "2025-01-10",
        "dueDate": "2025-02-10",
        "status": "Open",
        "correctiveActions": [
            { "id": "a1", "description": "Recalibrate press", "assignedTo": "Engineering",
              "dueDate": "2025-01-20", "status": "In_Progress" }
        ]
    }))
    .unwrap()
}

fn press() -> Equipment {
    serde_json::from_value(json!({
        "id": "eq-1",
        "name": "Rotary tablet press",
        "qualificationStatus": { "iq": true, "oq": true, "pq": false },
        "calibrationSchedule": { "frequency": 180, "nextCalibration": "2025-06-30" },
        "status": "Active"
    }))
    .unwrap()
}

fn hardness_check() -> IpqcCheck {
    IpqcCheck {
        id: "ipqc-1".to_string(),
        batch_number: "PCM-001".to_string(),
        product_name: "Paracetamol".to_string(),
        dosage_form: IpqcDosageForm::Tablet,
        stage: ManufacturingStage::Compression,
        check_type: "Hardness".to_string(),
        parameter: "Hardness".to_string(),
        specification: "5.0 - 15.0 kp".to_string(),
        result: String::new(),
        samples: vec![8.1, 8.4, 7.9, 8.0],
        status: CheckStatus::Pass,
        checked_by: "Operator".to_string(),
        reviewed_by: None,
        checked_at: Utc.with_ymd_and_hms(2025, 1, 12, 11, 0, 0).unwrap(),
        notes: Some("line 2".to_string()),
    }
}

/// A database filled through the same commands a shift would issue, so the
/// nested collections (parameter slots, step executions, schedules) are
/// populated the way real data is.
fn populated() -> AppState {
    let mut store = StoreBuilder::new()
        .with_test_methods(vec![assay_method()])
        .with_stability_protocols(vec![protocol()])
        .with_master_formulas(vec![mfr()])
        .with_user("QA")
        .build()
        .unwrap();
    store
        .dispatch_all(vec![
            Command::StartTest {
                result_id: "tr-1".to_string(),
                protocol_id: "sp-1".to_string(),
                condition_id: "C1".to_string(),
                time_point_id: "T0".to_string(),
                test_method_id: "tm-assay".to_string(),
                analyst_id: "analyst-1".to_string(),
                test_date: day(),
            },
            Command::RecordParameterValue {
                result_id: "tr-1".to_string(),
                parameter_id: "p-assay".to_string(),
                value: ParameterValue::Number(99.4),
            },
            Command::RecordParameterValue {
                result_id: "tr-1".to_string(),
                parameter_id: "p-appearance".to_string(),
                value: ParameterValue::Text("Complies".to_string()),
            },
            Command::CompleteTest {
                result_id: "tr-1".to_string(),
                completed_at: Utc.with_ymd_and_hms(2025, 1, 11, 16, 0, 0).unwrap(),
            },
            Command::IssueBatch {
                batch_id: "bmr-1".to_string(),
                mfr_id: "mfr-1".to_string(),
                batch_number: "PCM-001".to_string(),
                mfg_date: Some(day()),
                expiry_date: NaiveDate::from_ymd_opt(2028, 1, 9),
                issued_on: day(),
                issued_by: "QA Manager".to_string(),
            },
            Command::SignStep {
                batch_id: "bmr-1".to_string(),
                step_number: 1,
                role: SignatureRole::Operator,
                signer: "Operator".to_string(),
                at: "2025-01-12T08:30".to_string(),
            },
            Command::RecordIpqcCheck { check: hardness_check() },
            Command::Insert { record: Record::Capa(capa()) },
            Command::Insert { record: Record::Equipment(press()) },
        ])
        .unwrap();
    store.into_state()
}

#[test]
fn export_then_import_reproduces_every_table() {
    let original = populated();
    assert_eq!(original.ipqc_checks[0].result, "8.100");
    for table in [
        Table::TestMethods,
        Table::TestResults,
        Table::StabilityProtocols,
        Table::MasterFormulas,
        Table::BatchRecords,
        Table::IpqcChecks,
        Table::Capas,
        Table::Equipment,
        Table::Activities,
    ] {
        assert!(original.len(table) > 0, "table {} is empty", table);
    }

    let json = pqms_core::backup::export_json(&original).unwrap();

    let mut target = StoreBuilder::new().build().unwrap();
    let events = target.import_json(&json).unwrap();
    assert!(matches!(events.as_slice(), [DomainEvent::DataRestored { tables: 16, .. }]));

    for table in Table::ALL {
        assert_eq!(target.state().len(table), original.len(table), "table {}", table);
    }
    assert_eq!(target.state(), &original);

    let values: Vec<&ParameterValue> = target.state().test_results[0].parameters.iter().map(|p| &p.value).collect();
    assert_eq!(
        values,
        [&ParameterValue::Number(99.4), &ParameterValue::Text("Complies".to_string())]
    );
    assert!(target.state().batch_records[0].step_executions[0].operator_signature.is_some());
}

#[test]
fn import_clears_tables_missing_from_the_file() {
    let mut store = StoreBuilder::new().with_state(populated()).build().unwrap();
    store.import_json(r#"{ "products": [], "unknownTable": [1, 2, 3] }"#).unwrap();
    assert!(store.state().is_empty());
}

#[test]
fn malformed_import_leaves_state_intact() {
    let original = populated();
    let mut store = StoreBuilder::new().with_state(original.clone()).build().unwrap();

    let err = store.import_json(r#"{ "ipqcChecks": [ { "id": "x" } ] }"#).unwrap_err();
    assert!(matches!(err, PqmsError::BackupFormat(_)));
    assert_eq!(store.state(), &original);

    let err = store.import_json("not json at all").unwrap_err();
    assert!(matches!(err, PqmsError::BackupFormat(_)));
    assert_eq!(store.state(), &original);
}

#[test]
fn backup_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pqms-backup.json");
    let original = populated();

    write_backup_file(&original, &path).unwrap();
    let (restored, _, _) = AppState::from_backup(read_backup_file(&path).unwrap());
    assert_eq!(restored, original);
}

#[test]
fn nan_samples_in_a_command_file_never_reach_the_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands.yaml");
    fs::write(
        &path,
        r#"
schema_version: "1.0"
commands:
  - type: record_ipqc_check
    check:
      id: ipqc-nan
      batchNumber: PCM-001
      productName: Paracetamol
      dosageForm: Tablet
      stage: Compression
      checkType: Hardness
      parameter: Hardness
      specification: 5.0 - 15.0 kp
      result: ""
      samples: [.nan, 8.0]
      status: Pass
      checkedBy: Operator
      checkedAt: 2025-01-12T11:00:00Z
"#,
    )
    .unwrap();

    let original = populated();
    let mut store = StoreBuilder::new().with_state(original.clone()).build().unwrap();
    let file = read_command_file(&path).unwrap();
    let err = store.dispatch_all(file.commands).unwrap_err();
    assert!(matches!(
        err,
        PqmsError::Validation(ValidationError::InvalidNumber { field: "samples", .. })
    ));
    assert_eq!(store.state(), &original);

    let restored: AppState = {
        let mut target = StoreBuilder::new().build().unwrap();
        target.import_json(&store.export_json().unwrap()).unwrap();
        target.into_state()
    };
    assert_eq!(restored, original);
}
