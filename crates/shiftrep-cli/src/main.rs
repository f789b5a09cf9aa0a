//! CLI application for recording free-text shift reports.

mod commands;
mod events;
mod notifier;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, export, import, parse, replay, reset, stats, watch};

/// Shift report bot - Parse, debounce and aggregate production/waste reports
#[derive(Parser)]
#[command(name = "shiftrep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single report text
    Parse(parse::ParseArgs),

    /// Replay a JSONL file of chat events
    Replay(replay::ReplayArgs),

    /// Read chat events from stdin and commit on a timer
    Watch(watch::WatchArgs),

    /// Show per-author statistics for the current month
    Stats(stats::StatsArgs),

    /// Export the current month's period file
    Export(export::ExportArgs),

    /// Replace the current month with rows from a CSV file
    Import(import::ImportArgs),

    /// Delete the current month's data
    Reset(reset::ResetArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Parse(args) => parse::run(args, config_path).await,
        Commands::Replay(args) => replay::run(args, config_path).await,
        Commands::Watch(args) => watch::run(args, config_path).await,
        Commands::Stats(args) => stats::run(args, config_path).await,
        Commands::Export(args) => export::run(args, config_path).await,
        Commands::Import(args) => import::run(args, config_path).await,
        Commands::Reset(args) => reset::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
