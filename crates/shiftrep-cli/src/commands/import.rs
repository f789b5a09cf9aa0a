//! Import command - replace the current month with rows from a CSV file.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;

use shiftrep_core::service::ReportService;
use shiftrep_core::storage::CsvReportStore;

use super::load_config;
use crate::notifier::TerminalNotifier;

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// CSV file in period file layout
    #[arg(required = true)]
    input: PathBuf,
}

pub async fn run(args: ImportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let rows = CsvReportStore::read_rows(&args.input)?;
    let now = Utc::now();
    // The current file is replaced, so it is not loaded first.
    let store = CsvReportStore::new(&config.storage.data_dir);
    let mut service = ReportService::new(&config, store, TerminalNotifier::new(), now)?;
    let imported = service.import_rows(rows, now)?;

    println!(
        "{} Imported {} rows into {}",
        style("✓").green(),
        imported,
        service.current_period_file(now).display()
    );

    Ok(())
}
