use crate::{
    activity::Activity,
    batch::{BatchRecord, MasterFormula},
    command::Command,
    equipment::Equipment,
    ipqc::IpqcCheck,
    market::{MarketComplaint, ProductRecall},
    personnel::{Supplier, TrainingRecord},
    product::Product,
    quality::{Audit, Capa, Deviation},
    stability::StabilityProtocol,
    testing::{TestMethod, TestResult},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MasterFormulaFile {
    pub schema_version: String,
    pub master_formulas: Vec<MasterFormula>,
}

#[derive(Debug, Deserialize)]
pub struct TestMethodFile {
    pub schema_version: String,
    pub test_methods: Vec<TestMethod>,
}

#[derive(Debug, Deserialize)]
pub struct StabilityProtocolFile {
    pub schema_version: String,
    pub stability_protocols: Vec<StabilityProtocol>,
}

/// A batch of commands applied in order, e.g. a shift's batch record entries.
#[derive(Debug, Deserialize)]
pub struct CommandFile {
    pub schema_version: String,
    pub commands: Vec<Command>,
}

/// A full-database backup: a JSON object keyed by table name. A missing key
/// means the table is absent from the backup; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_methods: Option<Vec<TestMethod>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capas: Option<Vec<Capa>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviations: Option<Vec<Deviation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<Equipment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_records: Option<Vec<TrainingRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audits: Option<Vec<Audit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Supplier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_complaints: Option<Vec<MarketComplaint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_recalls: Option<Vec<ProductRecall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_protocols: Option<Vec<StabilityProtocol>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipqc_checks: Option<Vec<IpqcCheck>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_formulas: Option<Vec<MasterFormula>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_records: Option<Vec<BatchRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
}
