//! The state transition function. `reduce` works on a copy of the state and
//! either returns the whole next state or an error, never a half-applied one.

use super::state::{AppState, WriteMode};
use crate::{
    error::{PqmsError, ValidationError},
    events::DomainEvent,
    ipqc,
    reconciliation::{format_yield, reconcile_yield},
    sample::SampleKey,
    status::{classify_overall, evaluate_parameter},
};
use chrono::{DateTime, NaiveDate, Utc};
use pqms_schemas::{
    activity::Activity,
    batch::{BatchRecord, BatchStatus, MaterialVerification, StepExecution, StepStatus},
    command::{Command, SignatureRole},
    file_formats::BackupFile,
    ipqc::IpqcCheck,
    record::{Record, Table},
    testing::{OverallResult, ParameterResult, ParameterValue, ParameterVerdict, TestResult, TestStatus},
};

/// Entries kept in the activity feed.
pub const ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: AppState,
    pub events: Vec<DomainEvent>,
}

pub fn reduce(state: &AppState, command: Command) -> Result<Transition, PqmsError> {
    let mut next = state.clone();
    let events = apply(&mut next, command)?;
    Ok(Transition { state: next, events })
}

fn apply(state: &mut AppState, command: Command) -> Result<Vec<DomainEvent>, PqmsError> {
    match command {
        Command::Insert {
            record: Record::Activity(activity),
        } => {
            if state.activities.iter().any(|a| a.id == activity.id) {
                return Err(PqmsError::DuplicateId {
                    table: Table::Activities,
                    id: activity.id,
                });
            }
            log_activity(state, activity);
            Ok(Vec::new())
        }
        Command::Insert { record } => {
            ensure_finite(&record)?;
            let (table, id) = (record.table(), record.id().to_string());
            state.write(record, WriteMode::Insert)?;
            Ok(vec![DomainEvent::RecordCreated { table, id }])
        }
        Command::Update { record } => {
            let (table, id) = (record.table(), record.id().to_string());
            if table == Table::IpqcChecks {
                return Err(PqmsError::InvalidTransition {
                    action: "update",
                    subject: format!("IPQC check {}", id),
                    status: "recorded".to_string(),
                });
            }
            ensure_finite(&record)?;
            state.write(record, WriteMode::Update)?;
            Ok(vec![DomainEvent::RecordUpdated { table, id }])
        }
        Command::Delete { table, id } => {
            state.remove(table, &id)?;
            Ok(vec![DomainEvent::RecordDeleted { table, id }])
        }
        Command::StartTest {
            result_id,
            protocol_id,
            condition_id,
            time_point_id,
            test_method_id,
            analyst_id,
            test_date,
        } => start_test(
            state,
            StartTest {
                result_id,
                protocol_id,
                condition_id,
                time_point_id,
                test_method_id,
                analyst_id,
                test_date,
            },
        ),
        Command::RecordParameterValue {
            result_id,
            parameter_id,
            value,
        } => record_parameter_value(state, &result_id, &parameter_id, value),
        Command::CompleteTest {
            result_id,
            completed_at,
        } => complete_test(state, &result_id, completed_at),
        Command::RecordIpqcCheck { check } => record_ipqc_check(state, check),
        Command::IssueBatch {
            batch_id,
            mfr_id,
            batch_number,
            mfg_date,
            expiry_date,
            issued_on,
            issued_by,
        } => {
            if state.batch_record(&batch_id).is_some() {
                return Err(PqmsError::DuplicateId {
                    table: Table::BatchRecords,
                    id: batch_id,
                });
            }
            let mfr = state
                .master_formula(&mfr_id)
                .ok_or_else(|| not_found(Table::MasterFormulas, &mfr_id))?;

            let batch = BatchRecord {
                id: batch_id.clone(),
                batch_number: batch_number.clone(),
                mfr_id: mfr.id.clone(),
                product_name: mfr.product_name.clone(),
                batch_size: mfr.batch_size,
                batch_size_unit: mfr.batch_size_unit.clone(),
                mfg_date,
                expiry_date,
                status: BatchStatus::Manufacturing,
                issuance_date: issued_on,
                issued_by,
                step_executions: mfr
                    .process_steps
                    .iter()
                    .map(|step| StepExecution {
                        step_number: step.step_number,
                        phase: Some(step.phase),
                        description: step.description.clone(),
                        planned_duration: step.planned_duration.clone(),
                        started_at: None,
                        completed_at: None,
                        operator_signature: None,
                        supervisor_signature: None,
                        qa_signature: None,
                        status: StepStatus::Pending,
                        comments: None,
                    })
                    .collect(),
                material_verifications: Vec::new(),
                actual_yield: None,
            };
            let product_name = batch.product_name.clone();
            state.batch_records.push(batch);
            Ok(vec![DomainEvent::BatchIssued {
                batch_id,
                batch_number,
                product_name,
            }])
        }
        Command::SignStep {
            batch_id,
            step_number,
            role,
            signer,
            at,
        } => sign_step(state, &batch_id, step_number, role, signer, at),
        Command::VerifyMaterial {
            batch_id,
            item_code,
            actual_qty,
            verified_by,
            verified_at,
        } => {
            if !actual_qty.is_finite() || actual_qty < 0.0 {
                return Err(ValidationError::InvalidNumber {
                    field: "actualQty",
                    value: actual_qty.to_string(),
                }
                .into());
            }
            let batch = batch_in_manufacturing(state, &batch_id, "verify material")?;
            let verification = MaterialVerification {
                item_code: item_code.clone(),
                actual_qty,
                verified_by,
                verified_at,
            };
            match batch
                .material_verifications
                .iter_mut()
                .find(|v| v.item_code == item_code)
            {
                Some(existing) => *existing = verification,
                None => batch.material_verifications.push(verification),
            }
            Ok(vec![DomainEvent::MaterialVerified {
                batch_id,
                item_code,
                actual_qty,
            }])
        }
        Command::RecordActualYield {
            batch_id,
            actual_yield,
        } => {
            if !actual_yield.is_finite() || actual_yield < 0.0 {
                return Err(ValidationError::InvalidNumber {
                    field: "actualYield",
                    value: actual_yield.to_string(),
                }
                .into());
            }
            let batch = batch_in_manufacturing(state, &batch_id, "record the actual yield")?;
            batch.actual_yield = Some(actual_yield);
            let percentage = format_yield(actual_yield, batch.batch_size);
            Ok(vec![DomainEvent::YieldRecorded {
                batch_id,
                batch_number: batch.batch_number.clone(),
                percentage,
            }])
        }
        Command::QuarantineBatch { batch_id } => quarantine_batch(state, &batch_id),
        Command::ReleaseBatch { batch_id } => {
            close_quarantine(state, &batch_id, BatchStatus::Released, "release")
        }
        Command::RejectBatch { batch_id } => {
            close_quarantine(state, &batch_id, BatchStatus::Rejected, "reject")
        }
        Command::LogActivity { activity } => {
            log_activity(state, activity);
            Ok(Vec::new())
        }
        Command::Restore { backup } => Ok(vec![restore(state, *backup)]),
    }
}

fn not_found(table: Table, id: &str) -> PqmsError {
    PqmsError::RecordNotFound {
        table,
        id: id.to_string(),
    }
}

struct StartTest {
    result_id: String,
    protocol_id: String,
    condition_id: String,
    time_point_id: String,
    test_method_id: String,
    analyst_id: String,
    test_date: NaiveDate,
}

fn start_test(state: &mut AppState, cmd: StartTest) -> Result<Vec<DomainEvent>, PqmsError> {
    if state.test_result(&cmd.result_id).is_some() {
        return Err(PqmsError::DuplicateId {
            table: Table::TestResults,
            id: cmd.result_id,
        });
    }
    let protocol = state
        .stability_protocol(&cmd.protocol_id)
        .ok_or_else(|| not_found(Table::StabilityProtocols, &cmd.protocol_id))?;
    if !protocol.storage_conditions.iter().any(|c| c.id == cmd.condition_id) {
        return Err(ValidationError::UnknownVariant {
            field: "conditionId",
            value: cmd.condition_id,
        }
        .into());
    }
    if !protocol.time_points.iter().any(|t| t.id == cmd.time_point_id) {
        return Err(ValidationError::UnknownVariant {
            field: "timePointId",
            value: cmd.time_point_id,
        }
        .into());
    }
    let method = state
        .test_method(&cmd.test_method_id)
        .ok_or_else(|| not_found(Table::TestMethods, &cmd.test_method_id))?;

    let sample_id: String =
        SampleKey::new(&protocol.protocol_number, &cmd.condition_id, &cmd.time_point_id).into();
    let result = TestResult {
        id: cmd.result_id.clone(),
        product_id: protocol.product_id.clone(),
        test_method_id: method.id.clone(),
        batch_number: protocol.batch_number.clone(),
        sample_id: sample_id.clone(),
        analyst_id: cmd.analyst_id,
        test_date: cmd.test_date,
        completion_date: None,
        parameters: method
            .parameters
            .iter()
            .map(|p| ParameterResult {
                parameter_id: p.id.clone(),
                parameter_name: p.name.clone(),
                value: ParameterValue::default(),
                unit: p.unit.clone(),
                result: ParameterVerdict::Pending,
            })
            .collect(),
        overall_result: OverallResult::Pending,
        status: TestStatus::InProgress,
        notes: None,
    };
    let test_method = method.name.clone();
    state.test_results.push(result);

    Ok(vec![DomainEvent::TestStarted {
        result_id: cmd.result_id,
        sample_id,
        test_method,
    }])
}

fn open_result<'a>(
    state: &'a mut AppState,
    result_id: &str,
    action: &'static str,
) -> Result<&'a mut TestResult, PqmsError> {
    let result = state
        .test_results
        .iter_mut()
        .find(|r| r.id == result_id)
        .ok_or_else(|| not_found(Table::TestResults, result_id))?;
    let status = result.status;
    match status {
        TestStatus::Scheduled | TestStatus::InProgress => Ok(result),
        frozen => Err(PqmsError::InvalidTransition {
            action,
            subject: format!("test result {}", result_id),
            status: format!("{:?}", frozen),
        }),
    }
}

/// NaN and infinities have no JSON form, so they would not survive a backup.
fn finite_value(field: &'static str, value: &ParameterValue) -> Result<(), ValidationError> {
    match value {
        ParameterValue::Number(n) if !n.is_finite() => Err(ValidationError::InvalidNumber {
            field,
            value: n.to_string(),
        }),
        _ => Ok(()),
    }
}

fn finite_samples(samples: &[f64]) -> Result<(), ValidationError> {
    match samples.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(ValidationError::InvalidNumber {
            field: "samples",
            value: v.to_string(),
        }),
        None => Ok(()),
    }
}

fn ensure_finite(record: &Record) -> Result<(), ValidationError> {
    match record {
        Record::IpqcCheck(check) => finite_samples(&check.samples),
        Record::TestResult(result) => result
            .parameters
            .iter()
            .try_for_each(|p| finite_value("value", &p.value)),
        _ => Ok(()),
    }
}

fn record_parameter_value(
    state: &mut AppState,
    result_id: &str,
    parameter_id: &str,
    value: ParameterValue,
) -> Result<Vec<DomainEvent>, PqmsError> {
    finite_value("value", &value)?;
    let definition = state
        .test_result(result_id)
        .and_then(|r| state.test_method(&r.test_method_id))
        .and_then(|m| m.parameters.iter().find(|p| p.id == parameter_id))
        .cloned();

    let result = open_result(state, result_id, "record a parameter value")?;
    let slot = result
        .parameters
        .iter_mut()
        .find(|p| p.parameter_id == parameter_id)
        .ok_or_else(|| PqmsError::ParameterNotFound {
            result_id: result_id.to_string(),
            parameter_id: parameter_id.to_string(),
        })?;

    slot.result = match &definition {
        Some(def) => evaluate_parameter(def, &value),
        None => ParameterVerdict::Pending,
    };
    slot.value = value;
    result.status = TestStatus::InProgress;

    Ok(vec![DomainEvent::RecordUpdated {
        table: Table::TestResults,
        id: result_id.to_string(),
    }])
}

fn complete_test(
    state: &mut AppState,
    result_id: &str,
    completed_at: DateTime<Utc>,
) -> Result<Vec<DomainEvent>, PqmsError> {
    let test_method = state
        .test_result(result_id)
        .map(|r| state.test_method_name(&r.test_method_id).to_string())
        .unwrap_or_default();

    let result = open_result(state, result_id, "complete")?;
    if let Some(blank) = result.parameters.iter().find(|p| p.value.is_blank()) {
        return Err(ValidationError::MissingParameterValue(blank.parameter_name.clone()).into());
    }

    let overall = match classify_overall(&result.parameters) {
        OverallResult::Pending => OverallResult::Pass,
        verdict => verdict,
    };
    result.overall_result = overall;
    result.status = TestStatus::Completed;
    result.completion_date = Some(completed_at);

    let sample_id = result.sample_id.clone();
    let mut events = vec![DomainEvent::TestCompleted {
        result_id: result_id.to_string(),
        sample_id: sample_id.clone(),
        test_method: test_method.clone(),
        overall,
    }];
    if overall == OverallResult::Oos {
        events.push(DomainEvent::OosDetected {
            result_id: result_id.to_string(),
            sample_id,
            test_method,
        });
    }
    Ok(events)
}

fn record_ipqc_check(state: &mut AppState, mut check: IpqcCheck) -> Result<Vec<DomainEvent>, PqmsError> {
    if state.ipqc_checks.iter().any(|c| c.id == check.id) {
        return Err(PqmsError::DuplicateId {
            table: Table::IpqcChecks,
            id: check.id,
        });
    }
    finite_samples(&check.samples)?;
    if check.result.trim().is_empty() {
        check.result = ipqc::evaluate(ipqc::formula_for_test(&check.check_type), &check.samples);
    }
    let event = DomainEvent::IpqcCheckRecorded {
        check_id: check.id.clone(),
        batch_number: check.batch_number.clone(),
        check_type: check.check_type.clone(),
        result: check.result.clone(),
        status: check.status,
    };
    state.ipqc_checks.push(check);
    Ok(vec![event])
}

fn batch_mut<'a>(state: &'a mut AppState, batch_id: &str) -> Result<&'a mut BatchRecord, PqmsError> {
    state
        .batch_records
        .iter_mut()
        .find(|b| b.id == batch_id)
        .ok_or_else(|| not_found(Table::BatchRecords, batch_id))
}

fn batch_in_manufacturing<'a>(
    state: &'a mut AppState,
    batch_id: &str,
    action: &'static str,
) -> Result<&'a mut BatchRecord, PqmsError> {
    let batch = batch_mut(state, batch_id)?;
    if batch.status != BatchStatus::Manufacturing {
        return Err(PqmsError::InvalidTransition {
            action,
            subject: format!("batch {}", batch.batch_number),
            status: batch.status.to_string(),
        });
    }
    Ok(batch)
}

fn sign_step(
    state: &mut AppState,
    batch_id: &str,
    step_number: u32,
    role: SignatureRole,
    signer: String,
    at: String,
) -> Result<Vec<DomainEvent>, PqmsError> {
    let batch = batch_in_manufacturing(state, batch_id, "sign a step")?;
    let step = batch
        .step_executions
        .iter_mut()
        .find(|s| s.step_number == step_number)
        .ok_or_else(|| PqmsError::StepNotFound {
            batch_id: batch_id.to_string(),
            step: step_number,
        })?;

    let refuse = |action: &'static str, status: StepStatus| PqmsError::InvalidTransition {
        action,
        subject: format!("step {}", step_number),
        status: format!("{:?}", status),
    };

    match role {
        SignatureRole::Operator => {
            if matches!(step.status, StepStatus::Completed | StepStatus::Skipped) {
                return Err(refuse("sign as operator", step.status));
            }
            step.operator_signature = Some(signer.clone());
            step.started_at = Some(at);
            step.status = StepStatus::InProgress;
        }
        SignatureRole::Supervisor => {
            if step.operator_signature.is_none() || step.status != StepStatus::InProgress {
                return Err(refuse("countersign as supervisor", step.status));
            }
            step.supervisor_signature = Some(signer.clone());
            step.completed_at = Some(at);
            step.status = StepStatus::Completed;
        }
        SignatureRole::Qa => {
            if step.supervisor_signature.is_none() {
                return Err(refuse("countersign as QA", step.status));
            }
            step.qa_signature = Some(signer.clone());
        }
    }

    Ok(vec![DomainEvent::StepSigned {
        batch_id: batch_id.to_string(),
        step_number,
        role,
        signer,
    }])
}

fn quarantine_batch(state: &mut AppState, batch_id: &str) -> Result<Vec<DomainEvent>, PqmsError> {
    let (mfr_id, actual_yield) = {
        let batch = batch_in_manufacturing(state, batch_id, "quarantine")?;
        (batch.mfr_id.clone(), batch.actual_yield)
    };
    let actual_yield = actual_yield.ok_or(ValidationError::MissingField("actualYield"))?;
    let range = state
        .master_formula(&mfr_id)
        .map(|m| m.theoretical_yield_range)
        .ok_or_else(|| not_found(Table::MasterFormulas, &mfr_id))?;

    let batch = batch_mut(state, batch_id)?;
    let reconciliation = reconcile_yield(actual_yield, batch.batch_size, range);
    if !reconciliation.verdict.is_within() {
        return Err(PqmsError::YieldOutOfLimit {
            batch_id: batch_id.to_string(),
            percentage: reconciliation.formatted,
            min: range.min,
            max: range.max,
        });
    }
    batch.status = BatchStatus::Quarantine;

    Ok(vec![DomainEvent::BatchStatusChanged {
        batch_id: batch_id.to_string(),
        batch_number: batch.batch_number.clone(),
        status: BatchStatus::Quarantine,
    }])
}

fn close_quarantine(
    state: &mut AppState,
    batch_id: &str,
    to: BatchStatus,
    action: &'static str,
) -> Result<Vec<DomainEvent>, PqmsError> {
    let batch = batch_mut(state, batch_id)?;
    if batch.status != BatchStatus::Quarantine {
        return Err(PqmsError::InvalidTransition {
            action,
            subject: format!("batch {}", batch.batch_number),
            status: batch.status.to_string(),
        });
    }
    batch.status = to;
    Ok(vec![DomainEvent::BatchStatusChanged {
        batch_id: batch_id.to_string(),
        batch_number: batch.batch_number.clone(),
        status: to,
    }])
}

fn log_activity(state: &mut AppState, activity: Activity) {
    state.activities.insert(0, activity);
    state.activities.truncate(ACTIVITY_LIMIT);
}

fn restore(state: &mut AppState, backup: BackupFile) -> DomainEvent {
    let (restored, tables, records) = AppState::from_backup(backup);
    *state = restored;
    DomainEvent::DataRestored { tables, records }
}
