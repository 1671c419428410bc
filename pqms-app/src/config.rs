use anyhow::{Context, Result};
use pqms_core::dashboard::DashboardWindows;
use pqms_schemas::{
    batch::MasterFormula,
    file_formats::{MasterFormulaFile, StabilityProtocolFile, TestMethodFile},
    stability::StabilityProtocol,
    testing::TestMethod,
};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// Settings read from `pqms.yaml`. Every field has a default, so a missing
/// file or an empty one is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding every table, in the backup format.
    pub data_file: String,
    pub library_dir: String,
    /// CSV audit trail of domain events; appended to on every run.
    pub activity_log: Option<String>,
    pub output_dir: String,
    /// Recorded as the author of every activity.
    pub user: String,
    pub dashboard: DashboardWindows,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: "./data/pqms.json".to_string(),
            library_dir: "./data/library".to_string(),
            activity_log: Some("./data/activity_log.csv".to_string()),
            output_dir: "./data/reports".to_string(),
            user: "System".to_string(),
            dashboard: DashboardWindows::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            println!("No configuration at '{}', using defaults.", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path))
    }
}

/// Reference data maintained as YAML under the library directory.
pub struct ReferenceLibrary {
    pub master_formulas: HashMap<String, MasterFormula>,
    pub test_methods: HashMap<String, TestMethod>,
    pub stability_protocols: HashMap<String, StabilityProtocol>,
}

impl ReferenceLibrary {
    pub fn load(base_path: &str) -> Result<Self> {
        println!("Loading reference library from '{}'...", base_path);

        let master_formulas = load_yaml_files_into_map(
            Path::new(base_path).join("master_formulas"),
            |file: MasterFormulaFile| file.master_formulas,
            |item: &MasterFormula| item.id.clone(),
        )?;
        let test_methods = load_yaml_files_into_map(
            Path::new(base_path).join("test_methods"),
            |file: TestMethodFile| file.test_methods,
            |item: &TestMethod| item.id.clone(),
        )?;
        let stability_protocols = load_yaml_files_into_map(
            Path::new(base_path).join("stability_protocols"),
            |file: StabilityProtocolFile| file.stability_protocols,
            |item: &StabilityProtocol| item.id.clone(),
        )?;

        println!(
            "Reference library loaded: {} master formulas, {} test methods, {} stability protocols.",
            master_formulas.len(),
            test_methods.len(),
            stability_protocols.len()
        );
        Ok(Self {
            master_formulas,
            test_methods,
            stability_protocols,
        })
    }

    /// Map values sorted by id, so seeding is reproducible.
    pub fn sorted<T: Clone>(map: &HashMap<String, T>) -> Vec<T> {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        keys.into_iter().filter_map(|k| map.get(k).cloned()).collect()
    }
}

/// Loads every YAML file of a directory into a map. A missing directory
/// yields an empty map.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>,
    E: Fn(F) -> Vec<T>,
    K: Fn(&T) -> String,
{
    let mut map = HashMap::new();
    if !dir_path.as_ref().is_dir() {
        println!("  - Skipping missing directory {:?}", dir_path.as_ref());
        return Ok(map);
    }
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            let content = fs::read_to_string(&path)?;
            let file_wrapper: F = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

            for item in extract_vec(file_wrapper) {
                map.insert(get_key(&item), item);
            }
        }
    }
    Ok(map)
}
