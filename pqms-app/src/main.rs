use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pqms_schemas::batch::YieldRange;

mod config;
mod plotting;
mod workflow;

#[derive(Parser, Debug)]
#[command(name = "pqms", about = "Pharmaceutical quality management: stability, IPQC and batch records")]
struct Cli {
    /// Path to the YAML configuration.
    #[arg(long, default_value = "pqms.yaml")]
    config: String,

    /// Overrides `data_file` from the configuration.
    #[arg(long)]
    data_file: Option<String>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Evaluates an IPQC test over raw sample readings.
    Ipqc {
        test: String,
        samples: Vec<String>,
        /// Formula tag overriding the catalog, e.g. `hausner` or `avg`.
        #[arg(long)]
        formula: Option<String>,
    },
    /// Lists the IPQC tests applicable to a dosage form.
    Catalog { form: String },
    /// Reconciles an actual yield against the batch size.
    Yield {
        actual: f64,
        batch_size: f64,
        #[arg(long, default_value_t = 98.0)]
        min: f64,
        #[arg(long, default_value_t = 101.0)]
        max: f64,
    },
    /// Prints the stability matrix of a protocol, by id or protocol number.
    Stability {
        protocol: String,
        #[arg(long)]
        chart: bool,
        #[arg(long)]
        csv: bool,
    },
    /// Prints the dashboard counters.
    Dashboard {
        /// Reference date, defaults to today (UTC).
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Applies a YAML command file to the database.
    Apply { file: String },
    /// Writes a full JSON backup.
    Export { output: String },
    /// Replaces the database with a JSON backup.
    Import { input: String },
    /// Loads the reference library into the database.
    Seed,
    /// Lists the IPQC checks of a batch and charts their samples.
    IpqcChart { batch: String },
}

fn main() -> Result<()> {
    println!("--- PQMS ---");
    let cli = Cli::parse();

    let mut config = config::AppConfig::load(&cli.config)?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }

    match cli.command {
        Action::Ipqc { test, samples, formula } => {
            workflow::report_ipqc(&test, &samples, formula.as_deref())?
        }
        Action::Catalog { form } => workflow::report_catalog(&form)?,
        Action::Yield { actual, batch_size, min, max } => {
            workflow::report_yield(actual, batch_size, YieldRange { min, max })?
        }
        Action::Stability { protocol, chart, csv } => {
            workflow::report_stability(&config, &protocol, chart, csv)?
        }
        Action::Dashboard { today } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            workflow::report_dashboard(&config, today)?
        }
        Action::Apply { file } => {
            workflow::apply_command_file(&config, &file)?;
        }
        Action::Export { output } => workflow::export(&config, &output)?,
        Action::Import { input } => workflow::import(&config, &input)?,
        Action::Seed => workflow::seed(&config)?,
        Action::IpqcChart { batch } => workflow::chart_ipqc(&config, &batch)?,
    }

    Ok(())
}
