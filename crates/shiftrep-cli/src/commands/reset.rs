//! Reset command - delete the current month's data.

use chrono::Utc;
use clap::Args;
use console::style;

use shiftrep_core::models::report::Period;

use super::{load_config, open_service};

/// Arguments for the reset command.
#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation guard
    #[arg(long)]
    yes: bool,
}

pub async fn run(args: ResetArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let now = Utc::now();
    if !args.yes {
        anyhow::bail!(
            "This deletes all data for {}. Re-run with --yes to confirm.",
            Period::of(now)
        );
    }

    let config = load_config(config_path)?;
    let mut service = open_service(&config, now)?;
    service.reset_period(now)?;

    println!(
        "{} Data for {} has been reset",
        style("✓").green(),
        Period::of(now)
    );

    Ok(())
}
