//! Export command - locate or copy the current month's period file.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;

use shiftrep_core::models::report::Period;
use shiftrep_core::storage::{CsvReportStore, ReportStore};

use super::load_config;

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Copy the period file here instead of printing its path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = CsvReportStore::new(&config.storage.data_dir);
    let path = store.period_file(Period::of(Utc::now()));

    if !path.exists() {
        anyhow::bail!("No data for the current month: {}", path.display());
    }

    match args.output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::copy(&path, &output)?;
            println!(
                "{} Exported {} to {}",
                style("✓").green(),
                path.display(),
                output.display()
            );
        }
        None => println!("{}", path.display()),
    }

    Ok(())
}
