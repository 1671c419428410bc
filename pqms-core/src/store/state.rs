use crate::error::PqmsError;
use pqms_schemas::{
    activity::Activity,
    batch::{BatchRecord, MasterFormula},
    equipment::Equipment,
    file_formats::BackupFile,
    ipqc::IpqcCheck,
    market::{MarketComplaint, ProductRecall},
    personnel::{Supplier, TrainingRecord},
    product::Product,
    quality::{Audit, Capa, Deviation},
    record::{Record, Table},
    stability::StabilityProtocol,
    testing::{TestMethod, TestResult},
};
use serde::{Deserialize, Serialize};

/// Label shown wherever a referenced record no longer exists.
pub const UNKNOWN: &str = "Unknown";

/// Every table, in insertion order. Activities are newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub products: Vec<Product>,
    pub test_methods: Vec<TestMethod>,
    pub test_results: Vec<TestResult>,
    pub capas: Vec<Capa>,
    pub deviations: Vec<Deviation>,
    pub equipment: Vec<Equipment>,
    pub training_records: Vec<TrainingRecord>,
    pub audits: Vec<Audit>,
    pub suppliers: Vec<Supplier>,
    pub market_complaints: Vec<MarketComplaint>,
    pub product_recalls: Vec<ProductRecall>,
    pub stability_protocols: Vec<StabilityProtocol>,
    pub ipqc_checks: Vec<IpqcCheck>,
    pub master_formulas: Vec<MasterFormula>,
    pub batch_records: Vec<BatchRecord>,
    pub activities: Vec<Activity>,
}

pub(crate) trait HasId {
    fn id(&self) -> &str;
}

macro_rules! impl_has_id {
    ($($ty:ty),* $(,)?) => {
        $(impl HasId for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_has_id!(
    Product,
    TestMethod,
    TestResult,
    Capa,
    Deviation,
    Equipment,
    TrainingRecord,
    Audit,
    Supplier,
    MarketComplaint,
    ProductRecall,
    StabilityProtocol,
    IpqcCheck,
    MasterFormula,
    BatchRecord,
    Activity,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Insert,
    Update,
}

fn write<T: HasId>(rows: &mut Vec<T>, row: T, table: Table, mode: WriteMode) -> Result<(), PqmsError> {
    let existing = rows.iter().position(|r| r.id() == row.id());
    match (mode, existing) {
        (WriteMode::Insert, None) => rows.push(row),
        (WriteMode::Update, Some(index)) => rows[index] = row,
        (WriteMode::Insert, Some(_)) => {
            return Err(PqmsError::DuplicateId {
                table,
                id: row.id().to_string(),
            })
        }
        (WriteMode::Update, None) => {
            return Err(PqmsError::RecordNotFound {
                table,
                id: row.id().to_string(),
            })
        }
    }
    Ok(())
}

fn remove<T: HasId>(rows: &mut Vec<T>, id: &str, table: Table) -> Result<(), PqmsError> {
    let index = rows
        .iter()
        .position(|r| r.id() == id)
        .ok_or_else(|| PqmsError::RecordNotFound {
            table,
            id: id.to_string(),
        })?;
    rows.remove(index);
    Ok(())
}

fn fill<T>(rows: &mut Vec<T>, incoming: Option<Vec<T>>, tables: &mut usize, records: &mut usize) {
    if let Some(incoming) = incoming {
        *tables += 1;
        *records += incoming.len();
        *rows = incoming;
    }
}

impl AppState {
    pub(crate) fn write(&mut self, record: Record, mode: WriteMode) -> Result<(), PqmsError> {
        let table = record.table();
        match record {
            Record::Product(r) => write(&mut self.products, r, table, mode),
            Record::TestMethod(r) => write(&mut self.test_methods, r, table, mode),
            Record::TestResult(r) => write(&mut self.test_results, r, table, mode),
            Record::Capa(r) => write(&mut self.capas, r, table, mode),
            Record::Deviation(r) => write(&mut self.deviations, r, table, mode),
            Record::Equipment(r) => write(&mut self.equipment, r, table, mode),
            Record::TrainingRecord(r) => write(&mut self.training_records, r, table, mode),
            Record::Audit(r) => write(&mut self.audits, r, table, mode),
            Record::Supplier(r) => write(&mut self.suppliers, r, table, mode),
            Record::MarketComplaint(r) => write(&mut self.market_complaints, r, table, mode),
            Record::ProductRecall(r) => write(&mut self.product_recalls, r, table, mode),
            Record::StabilityProtocol(r) => write(&mut self.stability_protocols, r, table, mode),
            Record::IpqcCheck(r) => write(&mut self.ipqc_checks, r, table, mode),
            Record::MasterFormula(r) => write(&mut self.master_formulas, r, table, mode),
            Record::BatchRecord(r) => write(&mut self.batch_records, r, table, mode),
            Record::Activity(r) => write(&mut self.activities, r, table, mode),
        }
    }

    pub(crate) fn remove(&mut self, table: Table, id: &str) -> Result<(), PqmsError> {
        match table {
            Table::Products => remove(&mut self.products, id, table),
            Table::TestMethods => remove(&mut self.test_methods, id, table),
            Table::TestResults => remove(&mut self.test_results, id, table),
            Table::Capas => remove(&mut self.capas, id, table),
            Table::Deviations => remove(&mut self.deviations, id, table),
            Table::Equipment => remove(&mut self.equipment, id, table),
            Table::TrainingRecords => remove(&mut self.training_records, id, table),
            Table::Audits => remove(&mut self.audits, id, table),
            Table::Suppliers => remove(&mut self.suppliers, id, table),
            Table::MarketComplaints => remove(&mut self.market_complaints, id, table),
            Table::ProductRecalls => remove(&mut self.product_recalls, id, table),
            Table::StabilityProtocols => remove(&mut self.stability_protocols, id, table),
            Table::IpqcChecks => remove(&mut self.ipqc_checks, id, table),
            Table::MasterFormulas => remove(&mut self.master_formulas, id, table),
            Table::BatchRecords => remove(&mut self.batch_records, id, table),
            Table::Activities => remove(&mut self.activities, id, table),
        }
    }

    /// Builds a state holding exactly the tables present in `backup`, along
    /// with the number of tables and records restored.
    pub fn from_backup(backup: BackupFile) -> (Self, usize, usize) {
        let mut state = AppState::default();
        let (mut t, mut n) = (0, 0);
        fill(&mut state.products, backup.products, &mut t, &mut n);
        fill(&mut state.test_methods, backup.test_methods, &mut t, &mut n);
        fill(&mut state.test_results, backup.test_results, &mut t, &mut n);
        fill(&mut state.capas, backup.capas, &mut t, &mut n);
        fill(&mut state.deviations, backup.deviations, &mut t, &mut n);
        fill(&mut state.equipment, backup.equipment, &mut t, &mut n);
        fill(&mut state.training_records, backup.training_records, &mut t, &mut n);
        fill(&mut state.audits, backup.audits, &mut t, &mut n);
        fill(&mut state.suppliers, backup.suppliers, &mut t, &mut n);
        fill(&mut state.market_complaints, backup.market_complaints, &mut t, &mut n);
        fill(&mut state.product_recalls, backup.product_recalls, &mut t, &mut n);
        fill(&mut state.stability_protocols, backup.stability_protocols, &mut t, &mut n);
        fill(&mut state.ipqc_checks, backup.ipqc_checks, &mut t, &mut n);
        fill(&mut state.master_formulas, backup.master_formulas, &mut t, &mut n);
        fill(&mut state.batch_records, backup.batch_records, &mut t, &mut n);
        fill(&mut state.activities, backup.activities, &mut t, &mut n);
        (state, t, n)
    }

    pub fn to_backup(&self) -> BackupFile {
        BackupFile {
            products: Some(self.products.clone()),
            test_methods: Some(self.test_methods.clone()),
            test_results: Some(self.test_results.clone()),
            capas: Some(self.capas.clone()),
            deviations: Some(self.deviations.clone()),
            equipment: Some(self.equipment.clone()),
            training_records: Some(self.training_records.clone()),
            audits: Some(self.audits.clone()),
            suppliers: Some(self.suppliers.clone()),
            market_complaints: Some(self.market_complaints.clone()),
            product_recalls: Some(self.product_recalls.clone()),
            stability_protocols: Some(self.stability_protocols.clone()),
            ipqc_checks: Some(self.ipqc_checks.clone()),
            master_formulas: Some(self.master_formulas.clone()),
            batch_records: Some(self.batch_records.clone()),
            activities: Some(self.activities.clone()),
        }
    }

    pub fn len(&self, table: Table) -> usize {
        match table {
            Table::Products => self.products.len(),
            Table::TestMethods => self.test_methods.len(),
            Table::TestResults => self.test_results.len(),
            Table::Capas => self.capas.len(),
            Table::Deviations => self.deviations.len(),
            Table::Equipment => self.equipment.len(),
            Table::TrainingRecords => self.training_records.len(),
            Table::Audits => self.audits.len(),
            Table::Suppliers => self.suppliers.len(),
            Table::MarketComplaints => self.market_complaints.len(),
            Table::ProductRecalls => self.product_recalls.len(),
            Table::StabilityProtocols => self.stability_protocols.len(),
            Table::IpqcChecks => self.ipqc_checks.len(),
            Table::MasterFormulas => self.master_formulas.len(),
            Table::BatchRecords => self.batch_records.len(),
            Table::Activities => self.activities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Table::ALL.iter().all(|t| self.len(*t) == 0)
    }

    pub fn test_method(&self, id: &str) -> Option<&TestMethod> {
        self.test_methods.iter().find(|m| m.id == id)
    }

    pub fn test_result(&self, id: &str) -> Option<&TestResult> {
        self.test_results.iter().find(|r| r.id == id)
    }

    pub fn stability_protocol(&self, id: &str) -> Option<&StabilityProtocol> {
        self.stability_protocols.iter().find(|p| p.id == id)
    }

    /// Looks a protocol up by id, falling back to its protocol number.
    pub fn find_protocol(&self, id_or_number: &str) -> Option<&StabilityProtocol> {
        self.stability_protocol(id_or_number).or_else(|| {
            self.stability_protocols
                .iter()
                .find(|p| p.protocol_number == id_or_number)
        })
    }

    pub fn master_formula(&self, id: &str) -> Option<&MasterFormula> {
        self.master_formulas.iter().find(|m| m.id == id)
    }

    pub fn batch_record(&self, id: &str) -> Option<&BatchRecord> {
        self.batch_records.iter().find(|b| b.id == id)
    }

    pub fn ipqc_checks_for_batch<'a>(&'a self, batch_number: &'a str) -> impl Iterator<Item = &'a IpqcCheck> {
        self.ipqc_checks
            .iter()
            .filter(move |c| c.batch_number.eq_ignore_ascii_case(batch_number))
    }

    pub fn test_method_name(&self, id: &str) -> &str {
        self.test_method(id).map_or(UNKNOWN, |m| m.name.as_str())
    }

    pub fn product_name(&self, id: &str) -> &str {
        self.products
            .iter()
            .find(|p| p.id == id)
            .map_or(UNKNOWN, |p| p.name.as_str())
    }
}
