use chrono::{NaiveDate, TimeZone, Utc};
use pqms_core::events::DomainEvent;
use pqms_core::progress::StabilityMatrix;
use pqms_core::status::{aggregate_sample_status, SampleStatus};
use pqms_core::store::{EventContext, EventSubscriber};
use pqms_core::{PqmsError, Store, StoreBuilder, ValidationError};
use pqms_schemas::activity::ActivityType;
use pqms_schemas::batch::{BatchStatus, MasterFormula, StepStatus};
use pqms_schemas::command::{Command, SignatureRole};
use pqms_schemas::stability::StabilityProtocol;
use pqms_schemas::testing::{OverallResult, ParameterValue, ParameterVerdict, TestMethod, TestStatus};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
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

fn dissolution_method() -> TestMethod {
    serde_json::from_value(json!({
        "id": "tm-diss",
        "name": "Dissolution",
        "category": "Dissolution",
        "status": "Active",
        "parameters": [ { "id": "p-q", "name": "Q at 30 min", "unit": "%", "minValue": 80.0 } ]
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
        "storageConditions": [
            { "id": "C1", "condition": "25°C/60% RH", "zone": "II" },
            { "id": "C2", "condition": "40°C/75% RH", "zone": "IVb" }
        ],
        "timePoints": [
            { "id": "T0", "label": "Initial", "month": 0, "scheduledDate": "2025-02-03" },
            { "id": "T3", "label": "3 Months", "month": 3, "scheduledDate": "2025-05-03" }
        ],
        "tests": ["tm-assay", "tm-diss"],
        "initiationDate": "2025-02-03",
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
            { "stepNumber": 2, "phase": "Manufacturing", "description": "Granulation" },
            { "stepNumber": 3, "phase": "Packaging", "description": "Blistering" }
        ]
    }))
    .unwrap()
}

fn store() -> Store {
    StoreBuilder::new()
        .with_test_methods(vec![assay_method(), dissolution_method()])
        .with_stability_protocols(vec![protocol()])
        .with_master_formulas(vec![mfr()])
        .with_user("QA Analyst")
        .build()
        .unwrap()
}

fn start(result_id: &str, condition: &str, time_point: &str, method: &str) -> Command {
    Command::StartTest {
        result_id: result_id.to_string(),
        protocol_id: "sp-1".to_string(),
        condition_id: condition.to_string(),
        time_point_id: time_point.to_string(),
        test_method_id: method.to_string(),
        analyst_id: "analyst-1".to_string(),
        test_date: day(),
    }
}

fn value(result_id: &str, parameter_id: &str, value: ParameterValue) -> Command {
    Command::RecordParameterValue {
        result_id: result_id.to_string(),
        parameter_id: parameter_id.to_string(),
        value,
    }
}

fn complete(result_id: &str) -> Command {
    Command::CompleteTest {
        result_id: result_id.to_string(),
        completed_at: Utc.with_ymd_and_hms(2025, 2, 4, 10, 0, 0).unwrap(),
    }
}

const SAMPLE: &str = "STB-2025-001-C1-T0";

fn required() -> Vec<String> {
    vec!["tm-assay".to_string(), "tm-diss".to_string()]
}

#[test]
fn stability_sample_moves_from_pending_to_completed() {
    let mut store = store();
    let status = |s: &Store| aggregate_sample_status(&s.state().test_results, SAMPLE, &required());
    assert_eq!(status(&store), SampleStatus::Pending);

    store.dispatch(start("r1", "C1", "T0", "tm-assay")).unwrap();
    assert_eq!(status(&store), SampleStatus::InProgress);
    assert_eq!(store.state().test_results[0].sample_id, SAMPLE);
    assert_eq!(store.state().test_results[0].parameters.len(), 2);

    store
        .dispatch_all(vec![
            value("r1", "p-assay", ParameterValue::Number(99.4)),
            value("r1", "p-appearance", ParameterValue::Text("Complies".to_string())),
            complete("r1"),
        ])
        .unwrap();
    // One of two required tests done.
    assert_eq!(status(&store), SampleStatus::Scheduled);

    store
        .dispatch_all(vec![
            start("r2", "C1", "T0", "tm-diss"),
            value("r2", "p-q", ParameterValue::Text("91".to_string())),
            complete("r2"),
        ])
        .unwrap();
    assert_eq!(status(&store), SampleStatus::Completed);

    let matrix = StabilityMatrix::build(&protocol(), &store.state().test_results);
    let progress = matrix.progress();
    assert_eq!((progress.completed, progress.total, progress.percent), (1, 4, 25));
}

#[test]
fn infinite_parameter_value_is_refused() {
    let mut store = store();
    store.dispatch(start("r1", "C1", "T0", "tm-assay")).unwrap();
    let before = store.state().clone();

    for bad in [f64::INFINITY, f64::NAN] {
        let err = store
            .dispatch(value("r1", "p-assay", ParameterValue::Number(bad)))
            .unwrap_err();
        assert!(matches!(
            err,
            PqmsError::Validation(ValidationError::InvalidNumber { field: "value", .. })
        ));
    }
    assert_eq!(store.state(), &before);
}

#[test]
fn out_of_spec_value_flags_the_sample() {
    let mut store = store();
    let events = store
        .dispatch_all(vec![
            start("r1", "C1", "T0", "tm-assay"),
            value("r1", "p-assay", ParameterValue::Number(92.0)),
            value("r1", "p-appearance", ParameterValue::Text("Complies".to_string())),
            complete("r1"),
        ])
        .unwrap();

    let result = &store.state().test_results[0];
    assert_eq!(result.parameters[0].result, ParameterVerdict::Fail);
    assert_eq!(result.overall_result, OverallResult::Oos);
    assert!(events.iter().any(|e| matches!(e, DomainEvent::OosDetected { .. })));
    assert_eq!(
        aggregate_sample_status(&store.state().test_results, SAMPLE, &required()),
        SampleStatus::Oos
    );
    assert_eq!(store.state().activities[0].activity_type, ActivityType::OosInvestigation);
}

#[test]
fn completed_results_are_frozen() {
    let mut store = store();
    store
        .dispatch_all(vec![
            start("r1", "C1", "T0", "tm-diss"),
            value("r1", "p-q", ParameterValue::Number(85.0)),
            complete("r1"),
        ])
        .unwrap();

    let err = store.dispatch(value("r1", "p-q", ParameterValue::Number(70.0))).unwrap_err();
    assert!(matches!(err, PqmsError::InvalidTransition { .. }));
    assert_eq!(store.state().test_results[0].parameters[0].value, ParameterValue::Number(85.0));
    assert_eq!(store.state().test_results[0].status, TestStatus::Completed);
}

#[test]
fn blank_parameter_blocks_completion() {
    let mut store = store();
    store.dispatch(start("r1", "C2", "T3", "tm-assay")).unwrap();
    store.dispatch(value("r1", "p-assay", ParameterValue::Number(100.0))).unwrap();

    let err = store.dispatch(complete("r1")).unwrap_err();
    assert!(matches!(err, PqmsError::Validation(_)));
    assert_eq!(store.state().test_results[0].status, TestStatus::InProgress);
}

#[test]
fn unknown_condition_is_rejected() {
    let mut store = store();
    let err = store.dispatch(start("r1", "C9", "T0", "tm-assay")).unwrap_err();
    assert!(matches!(err, PqmsError::Validation(_)));
    assert!(store.state().test_results.is_empty());
}

fn sign(step: u32, role: SignatureRole, signer: &str) -> Command {
    Command::SignStep {
        batch_id: "bmr-1".to_string(),
        step_number: step,
        role,
        signer: signer.to_string(),
        at: "2025-02-03T09:00".to_string(),
    }
}

fn issue() -> Command {
    Command::IssueBatch {
        batch_id: "bmr-1".to_string(),
        mfr_id: "mfr-1".to_string(),
        batch_number: "PCM-001".to_string(),
        mfg_date: Some(day()),
        expiry_date: None,
        issued_on: day(),
        issued_by: "QA Manager".to_string(),
    }
}

#[test]
fn batch_record_lifecycle() {
    let mut store = store();
    store.dispatch(issue()).unwrap();

    let batch = &store.state().batch_records[0];
    assert_eq!(batch.status, BatchStatus::Manufacturing);
    assert_eq!(batch.step_executions.len(), 3);
    assert!(batch.step_executions.iter().all(|s| s.status == StepStatus::Pending));

    let err = store.dispatch(sign(1, SignatureRole::Supervisor, "Sup")).unwrap_err();
    assert!(matches!(err, PqmsError::InvalidTransition { .. }));

    store
        .dispatch_all(vec![
            sign(1, SignatureRole::Operator, "Op"),
            sign(1, SignatureRole::Supervisor, "Sup"),
            sign(1, SignatureRole::Qa, "QA"),
            Command::VerifyMaterial {
                batch_id: "bmr-1".to_string(),
                item_code: "API-001".to_string(),
                actual_qty: 500.0,
                verified_by: "Op".to_string(),
                verified_at: "2025-02-03".to_string(),
            },
            Command::VerifyMaterial {
                batch_id: "bmr-1".to_string(),
                item_code: "API-001".to_string(),
                actual_qty: 500.2,
                verified_by: "Op".to_string(),
                verified_at: "2025-02-03".to_string(),
            },
        ])
        .unwrap();

    let batch = &store.state().batch_records[0];
    assert_eq!(batch.step_executions[0].status, StepStatus::Completed);
    assert_eq!(batch.step_executions[0].qa_signature.as_deref(), Some("QA"));
    assert_eq!(batch.material_verifications.len(), 1);
    assert_eq!(batch.material_verifications[0].actual_qty, 500.2);

    let release_early = store
        .dispatch(Command::ReleaseBatch { batch_id: "bmr-1".to_string() })
        .unwrap_err();
    assert!(matches!(release_early, PqmsError::InvalidTransition { .. }));

    store
        .dispatch(Command::RecordActualYield { batch_id: "bmr-1".to_string(), actual_yield: 970.0 })
        .unwrap();
    let out_of_limit = store
        .dispatch(Command::QuarantineBatch { batch_id: "bmr-1".to_string() })
        .unwrap_err();
    match out_of_limit {
        PqmsError::YieldOutOfLimit { percentage, .. } => assert_eq!(percentage, "97.00%"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(store.state().batch_records[0].status, BatchStatus::Manufacturing);

    store
        .dispatch_all(vec![
            Command::RecordActualYield { batch_id: "bmr-1".to_string(), actual_yield: 985.0 },
            Command::QuarantineBatch { batch_id: "bmr-1".to_string() },
            Command::ReleaseBatch { batch_id: "bmr-1".to_string() },
        ])
        .unwrap();
    assert_eq!(store.state().batch_records[0].status, BatchStatus::Released);
    assert_eq!(store.state().activities[0].activity_type, ActivityType::BatchReleased);
    assert_eq!(store.state().activities[0].user, "QA Analyst");
}

#[test]
fn yield_just_below_range_cannot_be_quarantined() {
    let mut store = store();
    store
        .dispatch_all(vec![
            issue(),
            Command::RecordActualYield { batch_id: "bmr-1".to_string(), actual_yield: 979.96 },
        ])
        .unwrap();
    let err = store
        .dispatch(Command::QuarantineBatch { batch_id: "bmr-1".to_string() })
        .unwrap_err();
    match err {
        PqmsError::YieldOutOfLimit { percentage, .. } => assert_eq!(percentage, "98.00%"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(store.state().batch_records[0].status, BatchStatus::Manufacturing);
}

#[test]
fn failed_later_step_keeps_earlier_writes() {
    let mut store = store();
    let err = store
        .dispatch_all(vec![issue(), sign(1, SignatureRole::Operator, "Op"), sign(9, SignatureRole::Operator, "Op")])
        .unwrap_err();
    assert!(matches!(err, PqmsError::StepNotFound { step: 9, .. }));
    assert_eq!(store.state().batch_records[0].step_executions[0].status, StepStatus::InProgress);
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<(String, String)>>>);

impl EventSubscriber for Recorder {
    fn on_event(&mut self, event: &DomainEvent, context: &EventContext) -> anyhow::Result<()> {
        self.0.borrow_mut().push((event.name().to_string(), context.user.clone()));
        Ok(())
    }
}

#[test]
fn subscribers_see_every_event_in_order() {
    let recorder = Recorder::default();
    let mut store = StoreBuilder::new()
        .with_master_formulas(vec![mfr()])
        .with_user("Supervisor")
        .with_subscriber(Box::new(recorder.clone()))
        .build()
        .unwrap();

    store.dispatch_all(vec![issue(), sign(2, SignatureRole::Operator, "Op")]).unwrap();

    let seen = recorder.0.borrow();
    let names: Vec<&str> = seen.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["batch_issued", "step_signed"]);
    assert!(seen.iter().all(|(_, user)| user == "Supervisor"));
}

struct Failing;

impl EventSubscriber for Failing {
    fn on_event(&mut self, _event: &DomainEvent, _context: &EventContext) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

#[test]
fn subscriber_failure_is_reported_after_commit() {
    let mut store = StoreBuilder::new()
        .with_master_formulas(vec![mfr()])
        .with_subscriber(Box::new(Failing))
        .build()
        .unwrap();

    let err = store.dispatch(issue()).unwrap_err();
    assert!(matches!(err, PqmsError::SubscriberError(_)));
    assert_eq!(store.state().batch_records.len(), 1);
}

#[test]
fn activity_log_file_records_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.csv");
    let mut store = StoreBuilder::new()
        .with_master_formulas(vec![mfr()])
        .with_activity_log_to_file(path.to_str().unwrap())
        .build()
        .unwrap();
    store.dispatch(issue()).unwrap();
    drop(store);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "batch_issued");
    assert_eq!(&rows[0][2], "bmr-1");
}
