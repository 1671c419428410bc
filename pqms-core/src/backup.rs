//! Full-database backup files: a JSON object keyed by table name, each value
//! the array of that table's records.

use crate::error::PqmsError;
use crate::store::state::AppState;
use pqms_schemas::file_formats::BackupFile;
use std::fs;
use std::path::Path;

pub fn export_json(state: &AppState) -> Result<String, PqmsError> {
    Ok(serde_json::to_string_pretty(&state.to_backup())?)
}

/// Parses a backup completely before anything is restored. Keys that do not
/// name a table are ignored.
pub fn parse_backup(json: &str) -> Result<BackupFile, PqmsError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| PqmsError::BackupFormat(e.to_string()))?;
    if !value.is_object() {
        return Err(PqmsError::BackupFormat(
            "expected an object keyed by table name".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| PqmsError::BackupFormat(e.to_string()))
}

pub fn write_backup_file(state: &AppState, path: &Path) -> Result<(), PqmsError> {
    let json = export_json(state)?;
    fs::write(path, json).map_err(|e| PqmsError::FileIO(path.display().to_string(), e))
}

pub fn read_backup_file(path: &Path) -> Result<BackupFile, PqmsError> {
    let json = fs::read_to_string(path).map_err(|e| PqmsError::FileIO(path.display().to_string(), e))?;
    parse_backup(&json)
}
