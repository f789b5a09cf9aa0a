//! Parse command - extract fields from a single report text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use shiftrep_core::models::report::Field;
use shiftrep_core::report::{LineReportParser, ParseResult, ReportDecision};
use shiftrep_core::service::format_confirmation;

use super::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Report text (default: read from --file or stdin)
    text: Option<String>,

    /// Read the report from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Author shown in the text confirmation
    #[arg(long, default_value = "—")]
    author: String,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Chat-style confirmation
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let parser = LineReportParser::from_config(&config.parser);

    let text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            fs::read_to_string(path)?
        }
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let result = parser.parse_detailed(&text);
    debug!("Parsed in {}us", result.processing_time_us);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text(&result, &args.author),
    }

    Ok(())
}

fn print_text(result: &ParseResult, author: &str) {
    match &result.decision {
        ReportDecision::Accepted(fields) => {
            println!("{}", format_confirmation(author, fields));
            if result.extrusion.fallback {
                println!(
                    "{} Extrusion taken from the trigger line",
                    style("ℹ").blue()
                );
            }
        }
        ReportDecision::Rejected { populated } => {
            println!(
                "{} Not a report: {} of {} fields found",
                style("✗").red(),
                populated,
                Field::PARSED.len()
            );
        }
    }
}
