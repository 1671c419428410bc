//! Raw form input, parsed once at submit time. Everything downstream works
//! on typed records; a form either converts completely or not at all.

use crate::error::ValidationError;
use crate::ipqc;
use chrono::{DateTime, NaiveDate, Utc};
use pqms_schemas::command::Command;
use pqms_schemas::ipqc::{CheckStatus, IpqcCheck};
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Deserialize;

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_variant<T: DeserializeOwned>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    let de: StrDeserializer<'_, ValueError> = value.trim().into_deserializer();
    T::deserialize(de).map_err(|_| ValidationError::UnknownVariant {
        field,
        value: value.to_string(),
    })
}

fn parse_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    match optional(value) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::InvalidDate { field, value: v }),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpqcCheckForm {
    pub batch_number: String,
    pub product_name: String,
    pub dosage_form: String,
    pub stage: String,
    pub check_type: String,
    pub parameter: String,
    pub specification: String,
    pub result: String,
    pub samples: Vec<String>,
    pub status: String,
    pub checked_by: String,
    pub notes: String,
}

impl IpqcCheckForm {
    /// The batch number is stored upper-cased. A blank result is derived
    /// from the numeric samples; a blank specification comes from the catalog.
    pub fn into_check(self, id: &str, checked_at: DateTime<Utc>) -> Result<IpqcCheck, ValidationError> {
        let batch_number = required("batchNumber", &self.batch_number)?.to_uppercase();
        let product_name = required("productName", &self.product_name)?;
        let check_type = required("checkType", &self.check_type)?;
        let dosage_form = parse_variant("dosageForm", &self.dosage_form)?;
        let stage = parse_variant("stage", &self.stage)?;
        let checked_by = required("checkedBy", &self.checked_by)?;

        let samples = ipqc::parse_samples(&self.samples);
        let result = match optional(&self.result) {
            Some(result) => result,
            None if !samples.is_empty() => ipqc::evaluate(ipqc::formula_for_test(&check_type), &samples),
            None => return Err(ValidationError::MissingField("result")),
        };

        let specification = optional(&self.specification)
            .or_else(|| ipqc::find_test(&check_type).map(|t| t.specification.to_string()))
            .unwrap_or_default();

        let status = match optional(&self.status) {
            Some(s) => parse_variant::<CheckStatus>("status", &s)?,
            None => CheckStatus::Pending,
        };

        Ok(IpqcCheck {
            id: id.to_string(),
            batch_number,
            product_name,
            dosage_form,
            stage,
            parameter: optional(&self.parameter).unwrap_or_else(|| check_type.clone()),
            check_type,
            specification,
            result,
            samples,
            status,
            checked_by,
            reviewed_by: None,
            checked_at,
            notes: optional(&self.notes),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchIssueForm {
    pub mfr_id: String,
    pub batch_number: String,
    pub mfg_date: String,
    pub expiry_date: String,
}

impl BatchIssueForm {
    pub fn into_command(self, batch_id: &str, issued_on: NaiveDate, issued_by: &str) -> Result<Command, ValidationError> {
        Ok(Command::IssueBatch {
            batch_id: batch_id.to_string(),
            mfr_id: required("mfrId", &self.mfr_id)?,
            batch_number: required("batchNumber", &self.batch_number)?,
            mfg_date: parse_date("mfgDate", &self.mfg_date)?,
            expiry_date: parse_date("expiryDate", &self.expiry_date)?,
            issued_on,
            issued_by: issued_by.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YieldForm {
    pub actual_yield: String,
}

impl YieldForm {
    pub fn into_command(self, batch_id: &str) -> Result<Command, ValidationError> {
        let raw = required("actualYield", &self.actual_yield)?;
        let actual_yield = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or(ValidationError::InvalidNumber {
                field: "actualYield",
                value: raw,
            })?;
        Ok(Command::RecordActualYield {
            batch_id: batch_id.to_string(),
            actual_yield,
        })
    }
}
