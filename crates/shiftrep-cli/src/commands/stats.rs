//! Stats command - per-author totals for the current month.

use chrono::Utc;
use clap::Args;

use super::{load_config, open_service};

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Print aggregates as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: StatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let service = open_service(&config, Utc::now())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(service.aggregates())?);
    } else {
        println!("{}", service.stats_summary());
    }

    Ok(())
}
