use crate::config::{AppConfig, ReferenceLibrary};
use crate::plotting;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use pqms_core::{
    backup,
    dashboard::DashboardStats,
    ipqc::{self, IpqcFormula},
    progress::StabilityMatrix,
    reconciliation::reconcile_yield,
    store::read_command_file,
    AppState, Store, StoreBuilder,
};
use pqms_schemas::batch::YieldRange;
use std::{fs, path::Path};

/// Reads the saved tables. A missing data file is an empty database.
pub fn load_state(data_file: &str) -> Result<AppState> {
    let path = Path::new(data_file);
    if !path.exists() {
        println!("No data file at '{}', starting from an empty database.", data_file);
        return Ok(AppState::default());
    }
    let backup = backup::read_backup_file(path)?;
    let (state, tables, records) = AppState::from_backup(backup);
    println!("Loaded {} records across {} tables from '{}'.", records, tables, data_file);
    Ok(state)
}

pub fn save_state(state: &AppState, data_file: &str) -> Result<()> {
    if let Some(parent) = Path::new(data_file).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    backup::write_backup_file(state, Path::new(data_file))?;
    Ok(())
}

/// Saved state plus the reference library, with the activity log attached.
pub fn open_store(config: &AppConfig) -> Result<Store> {
    let library = ReferenceLibrary::load(&config.library_dir)?;
    let state = load_state(&config.data_file)?;

    let mut builder = StoreBuilder::new()
        .with_state(state)
        .with_master_formulas(ReferenceLibrary::sorted(&library.master_formulas))
        .with_test_methods(ReferenceLibrary::sorted(&library.test_methods))
        .with_stability_protocols(ReferenceLibrary::sorted(&library.stability_protocols))
        .with_user(&config.user);
    if let Some(log_path) = &config.activity_log {
        if let Some(parent) = Path::new(log_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        builder = builder.with_activity_log_to_file(log_path);
    }
    Ok(builder.build()?)
}

/// Writes the reference library into the data file.
pub fn seed(config: &AppConfig) -> Result<()> {
    println!("\n--- [Workflow] Seeding database from reference library ---");
    let store = open_store(config)?;
    save_state(store.state(), &config.data_file)?;
    println!(
        "Database now holds {} master formulas, {} test methods, {} stability protocols.",
        store.state().master_formulas.len(),
        store.state().test_methods.len(),
        store.state().stability_protocols.len()
    );
    Ok(())
}

/// Applies every command of a YAML command file in order. Commands applied
/// before a failure are saved; the failure is then reported.
pub fn apply_command_file(config: &AppConfig, command_file: &str) -> Result<usize> {
    println!("\n--- [Workflow] Applying commands from '{}' ---", command_file);
    let file = read_command_file(Path::new(command_file))?;

    let mut store = open_store(config)?;
    let total = file.commands.len();
    let mut applied = 0;
    let mut failure = None;
    for (i, command) in file.commands.into_iter().enumerate() {
        match store.dispatch(command) {
            Ok(events) => {
                applied += 1;
                for event in &events {
                    println!("  [{}/{}] {}", i + 1, total, event.description());
                }
            }
            Err(e) => {
                failure = Some(anyhow!(e).context(format!("Command {} of {} failed", i + 1, total)));
                break;
            }
        }
    }

    save_state(store.state(), &config.data_file)?;
    println!("Applied {} of {} commands.", applied, total);
    match failure {
        Some(e) => Err(e),
        None => Ok(applied),
    }
}

pub fn export(config: &AppConfig, output: &str) -> Result<()> {
    let state = load_state(&config.data_file)?;
    let json = backup::export_json(&state)?;
    fs::write(output, json).with_context(|| format!("Failed to write {}", output))?;
    println!("Exported {} tables to '{}'.", pqms_schemas::record::Table::ALL.len(), output);
    Ok(())
}

/// Replaces the database with a backup. A malformed file leaves it untouched.
pub fn import(config: &AppConfig, input: &str) -> Result<()> {
    let json = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?;
    let mut store = open_store(config)?;
    for event in store.import_json(&json)? {
        println!("{}", event.description());
    }
    save_state(store.state(), &config.data_file)?;
    Ok(())
}

pub fn report_ipqc(test_name: &str, samples: &[String], formula: Option<&str>) -> Result<()> {
    let formula = match formula {
        Some(tag) => IpqcFormula::from_tag(tag).ok_or_else(|| anyhow!("Unknown formula '{}'", tag))?,
        None => ipqc::formula_for_test(test_name),
    };
    let values = ipqc::parse_samples(samples);
    println!("Test:          {}", test_name);
    if let Some(test) = ipqc::find_test(test_name) {
        println!("Specification: {}", test.specification);
        if !test.labels.is_empty() {
            println!("Inputs:        {}", test.labels.join(", "));
        }
    }
    println!("Formula:       {}", formula);
    println!("Samples used:  {}", values.len());
    println!("Result:        {}", ipqc::evaluate(formula, &values));
    Ok(())
}

pub fn report_catalog(form: &str) -> Result<()> {
    let tests = ipqc::tests_for_form(form);
    if tests.is_empty() {
        bail!("No IPQC tests apply to dosage form '{}'", form);
    }
    println!("--- IPQC tests for {} ---", form);
    for test in tests {
        println!(
            "  {:<24} {:<15} n={:<3} {}",
            test.name, test.category, test.sample_size, test.specification
        );
    }
    Ok(())
}

pub fn report_yield(actual: f64, batch_size: f64, range: YieldRange) -> Result<()> {
    let reconciliation = reconcile_yield(actual, batch_size, range);
    println!(
        "Yield {} of {} -> {} ({}, limits {}% - {}%)",
        actual, batch_size, reconciliation.formatted, reconciliation.verdict, range.min, range.max
    );
    Ok(())
}

pub fn report_stability(config: &AppConfig, protocol: &str, chart: bool, csv_out: bool) -> Result<()> {
    let state = load_state(&config.data_file)?;
    let protocol = state
        .find_protocol(protocol)
        .ok_or_else(|| anyhow!("Stability protocol '{}' not found", protocol))?;
    let matrix = StabilityMatrix::build(protocol, &state.test_results);
    let progress = matrix.progress();

    println!(
        "\n--- [Stability] {} | {} ({}) ---",
        matrix.protocol_number, protocol.product_name, protocol.batch_number
    );
    print!("{:<28}", "");
    for tp in &matrix.time_points {
        print!("{:<13}", tp.label);
    }
    println!();
    for (condition, row) in matrix.conditions.iter().zip(&matrix.rows) {
        print!("{:<28}", condition.condition);
        for cell in row {
            print!("{:<13}", cell.status.label());
        }
        println!();
    }
    println!(
        "Progress: {}/{} samples complete ({}%)",
        progress.completed, progress.total, progress.percent
    );

    if chart || csv_out {
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("Failed to create output directory: {}", config.output_dir))?;
    }
    if chart {
        let path = plotting::plot_stability_matrix(&config.output_dir, &matrix)?;
        println!("Chart saved to '{}'.", path);
    }
    if csv_out {
        let path = format!("{}/stability_{}.csv", config.output_dir, matrix.protocol_number);
        matrix.write_csv(Path::new(&path))?;
        println!("Matrix saved to '{}'.", path);
    }
    Ok(())
}

pub fn report_dashboard(config: &AppConfig, today: NaiveDate) -> Result<()> {
    let state = load_state(&config.data_file)?;
    let stats = DashboardStats::compute(&state, today, &config.dashboard);

    println!("\n--- [Dashboard] {} ---", today);
    println!("Products:            {}", stats.total_products);
    for (status, count) in &stats.products_by_status {
        println!("  {:<18} {}", format!("{:?}", status), count);
    }
    println!("Pending tests:       {}", stats.pending_tests);
    println!("OOS results:         {}", stats.oos_results);
    println!("Open deviations:     {}", stats.open_deviations);
    println!("Open CAPAs:          {}", stats.open_capas);
    println!("Calibrations due:    {} (next {} days)", stats.calibrations_due, config.dashboard.calibration_days);
    println!("Expiring products:   {} (next {} days)", stats.expiring_products, config.dashboard.expiry_days);
    println!("Open complaints:     {}", stats.open_complaints);
    println!("Active recalls:      {}", stats.active_recalls);
    println!("Recent activity:");
    for activity in &stats.recent_activities {
        println!(
            "  {} {:<8} {}",
            activity.timestamp.format("%Y-%m-%d %H:%M"),
            activity.user,
            activity.description
        );
    }
    Ok(())
}

/// Sample trend chart for a batch, plus the activity timeline when a log
/// is configured.
pub fn chart_ipqc(config: &AppConfig, batch_number: &str) -> Result<()> {
    let state = load_state(&config.data_file)?;
    let checks: Vec<_> = state.ipqc_checks_for_batch(batch_number).collect();
    if checks.is_empty() {
        bail!("No IPQC checks recorded for batch '{}'", batch_number);
    }
    println!("\n--- [IPQC] {} checks for batch {} ---", checks.len(), batch_number);
    for check in &checks {
        println!(
            "  {:<24} {:<12} {:<10} {:?}",
            check.check_type, check.result, check.specification, check.status
        );
    }

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", config.output_dir))?;
    if let Some(path) = plotting::plot_ipqc_samples(&config.output_dir, &batch_number.to_uppercase(), &checks)? {
        println!("Chart saved to '{}'.", path);
    }
    if let Some(log_path) = config.activity_log.as_deref().filter(|p| Path::new(p).exists()) {
        if let Some(path) = plotting::plot_activity_timeline(&config.output_dir, log_path)? {
            println!("Activity timeline saved to '{}'.", path);
        }
    }
    Ok(())
}
