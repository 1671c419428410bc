use pqms_schemas::record::Table;
use thiserror::Error;

/// Raised at the form boundary, before anything is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Field '{field}' expects a date (YYYY-MM-DD), got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Field '{field}' does not accept '{value}'")]
    UnknownVariant { field: &'static str, value: String },

    #[error("Parameter '{0}' has no value")]
    MissingParameterValue(String),
}

#[derive(Debug, Error)]
pub enum PqmsError {
    #[error("Record '{id}' not found in table '{table}'")]
    RecordNotFound { table: Table, id: String },

    #[error("Record '{id}' already exists in table '{table}'")]
    DuplicateId { table: Table, id: String },

    #[error("Step {step} not found in batch record '{batch_id}'")]
    StepNotFound { batch_id: String, step: u32 },

    #[error("Parameter '{parameter_id}' not found in test result '{result_id}'")]
    ParameterNotFound { result_id: String, parameter_id: String },

    #[error("Cannot {action} while {subject} is {status}")]
    InvalidTransition {
        action: &'static str,
        subject: String,
        status: String,
    },

    #[error("Actual yield {percentage} is outside {min}% - {max}% for batch '{batch_id}'")]
    YieldOutOfLimit {
        batch_id: String,
        percentage: String,
        min: f64,
        max: f64,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Backup file is not a valid table export: {0}")]
    BackupFormat(String),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("An event subscriber failed: {0}")]
    SubscriberError(#[from] anyhow::Error),
}
