use crate::{
    activity::Activity,
    file_formats::BackupFile,
    ipqc::IpqcCheck,
    record::{Record, Table},
    testing::ParameterValue,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureRole {
    Operator,
    Supervisor,
    Qa,
}

/// Every state change goes through one of these. Ids and timestamps are
/// supplied by the caller so that applying a command is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Insert {
        record: Record,
    },
    Update {
        record: Record,
    },
    Delete {
        table: Table,
        id: String,
    },
    StartTest {
        result_id: String,
        protocol_id: String,
        condition_id: String,
        time_point_id: String,
        test_method_id: String,
        analyst_id: String,
        test_date: NaiveDate,
    },
    RecordParameterValue {
        result_id: String,
        parameter_id: String,
        value: ParameterValue,
    },
    CompleteTest {
        result_id: String,
        completed_at: DateTime<Utc>,
    },
    RecordIpqcCheck {
        check: IpqcCheck,
    },
    IssueBatch {
        batch_id: String,
        mfr_id: String,
        batch_number: String,
        #[serde(default)]
        mfg_date: Option<NaiveDate>,
        #[serde(default)]
        expiry_date: Option<NaiveDate>,
        issued_on: NaiveDate,
        issued_by: String,
    },
    SignStep {
        batch_id: String,
        step_number: u32,
        role: SignatureRole,
        signer: String,
        at: String,
    },
    VerifyMaterial {
        batch_id: String,
        item_code: String,
        actual_qty: f64,
        verified_by: String,
        verified_at: String,
    },
    RecordActualYield {
        batch_id: String,
        actual_yield: f64,
    },
    QuarantineBatch {
        batch_id: String,
    },
    ReleaseBatch {
        batch_id: String,
    },
    RejectBatch {
        batch_id: String,
    },
    LogActivity {
        activity: Activity,
    },
    Restore {
        backup: Box<BackupFile>,
    },
}
