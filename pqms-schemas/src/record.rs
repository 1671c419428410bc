use crate::{
    activity::Activity,
    batch::{BatchRecord, MasterFormula},
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
use std::fmt;

/// The persisted tables. The serialized names are the keys of the backup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    Products,
    TestMethods,
    TestResults,
    Capas,
    Deviations,
    Equipment,
    TrainingRecords,
    Audits,
    Suppliers,
    MarketComplaints,
    ProductRecalls,
    StabilityProtocols,
    IpqcChecks,
    MasterFormulas,
    BatchRecords,
    Activities,
}

impl Table {
    pub const ALL: [Table; 16] = [
        Table::Products,
        Table::TestMethods,
        Table::TestResults,
        Table::Capas,
        Table::Deviations,
        Table::Equipment,
        Table::TrainingRecords,
        Table::Audits,
        Table::Suppliers,
        Table::MarketComplaints,
        Table::ProductRecalls,
        Table::StabilityProtocols,
        Table::IpqcChecks,
        Table::MasterFormulas,
        Table::BatchRecords,
        Table::Activities,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::TestMethods => "testMethods",
            Table::TestResults => "testResults",
            Table::Capas => "capas",
            Table::Deviations => "deviations",
            Table::Equipment => "equipment",
            Table::TrainingRecords => "trainingRecords",
            Table::Audits => "audits",
            Table::Suppliers => "suppliers",
            Table::MarketComplaints => "marketComplaints",
            Table::ProductRecalls => "productRecalls",
            Table::StabilityProtocols => "stabilityProtocols",
            Table::IpqcChecks => "ipqcChecks",
            Table::MasterFormulas => "masterFormulas",
            Table::BatchRecords => "batchRecords",
            Table::Activities => "activities",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A record of any table, tagged with the table it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "data")]
pub enum Record {
    #[serde(rename = "products")]
    Product(Product),
    #[serde(rename = "testMethods")]
    TestMethod(TestMethod),
    #[serde(rename = "testResults")]
    TestResult(TestResult),
    #[serde(rename = "capas")]
    Capa(Capa),
    #[serde(rename = "deviations")]
    Deviation(Deviation),
    #[serde(rename = "equipment")]
    Equipment(Equipment),
    #[serde(rename = "trainingRecords")]
    TrainingRecord(TrainingRecord),
    #[serde(rename = "audits")]
    Audit(Audit),
    #[serde(rename = "suppliers")]
    Supplier(Supplier),
    #[serde(rename = "marketComplaints")]
    MarketComplaint(MarketComplaint),
    #[serde(rename = "productRecalls")]
    ProductRecall(ProductRecall),
    #[serde(rename = "stabilityProtocols")]
    StabilityProtocol(StabilityProtocol),
    #[serde(rename = "ipqcChecks")]
    IpqcCheck(IpqcCheck),
    #[serde(rename = "masterFormulas")]
    MasterFormula(MasterFormula),
    #[serde(rename = "batchRecords")]
    BatchRecord(BatchRecord),
    #[serde(rename = "activities")]
    Activity(Activity),
}

impl Record {
    pub fn table(&self) -> Table {
        match self {
            Record::Product(_) => Table::Products,
            Record::TestMethod(_) => Table::TestMethods,
            Record::TestResult(_) => Table::TestResults,
            Record::Capa(_) => Table::Capas,
            Record::Deviation(_) => Table::Deviations,
            Record::Equipment(_) => Table::Equipment,
            Record::TrainingRecord(_) => Table::TrainingRecords,
            Record::Audit(_) => Table::Audits,
            Record::Supplier(_) => Table::Suppliers,
            Record::MarketComplaint(_) => Table::MarketComplaints,
            Record::ProductRecall(_) => Table::ProductRecalls,
            Record::StabilityProtocol(_) => Table::StabilityProtocols,
            Record::IpqcCheck(_) => Table::IpqcChecks,
            Record::MasterFormula(_) => Table::MasterFormulas,
            Record::BatchRecord(_) => Table::BatchRecords,
            Record::Activity(_) => Table::Activities,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Product(r) => &r.id,
            Record::TestMethod(r) => &r.id,
            Record::TestResult(r) => &r.id,
            Record::Capa(r) => &r.id,
            Record::Deviation(r) => &r.id,
            Record::Equipment(r) => &r.id,
            Record::TrainingRecord(r) => &r.id,
            Record::Audit(r) => &r.id,
            Record::Supplier(r) => &r.id,
            Record::MarketComplaint(r) => &r.id,
            Record::ProductRecall(r) => &r.id,
            Record::StabilityProtocol(r) => &r.id,
            Record::IpqcCheck(r) => &r.id,
            Record::MasterFormula(r) => &r.id,
            Record::BatchRecord(r) => &r.id,
            Record::Activity(r) => &r.id,
        }
    }
}
