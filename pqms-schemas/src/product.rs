use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductStatus {
    Quarantine,
    Approved,
    Rejected,
    Released,
    Blocked,
    Expired,
    #[serde(rename = "Under_Test")]
    UnderTest,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 7] = [
        ProductStatus::Quarantine,
        ProductStatus::Approved,
        ProductStatus::Rejected,
        ProductStatus::Released,
        ProductStatus::Blocked,
        ProductStatus::Expired,
        ProductStatus::UnderTest,
    ];
}

/// A registered pharmaceutical product. Category, dosage form, storage
/// condition and pharmacopeia are open vocabularies and kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub generic_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    pub category: String,
    pub dosage_form: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub manufacturer: String,
    pub batch_number: String,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub storage_conditions: String,
    #[serde(default)]
    pub pharmacopeia_standard: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
