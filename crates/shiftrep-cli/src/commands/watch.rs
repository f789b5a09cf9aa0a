//! Watch command - read chat events from stdin and commit on a timer.

use chrono::Utc;
use clap::Args;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::{load_config, open_service, CliService};
use crate::events::ChatEvent;

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Override the commit delay, in seconds
    #[arg(long)]
    delay: Option<u64>,

    /// Drop pending reports at end of input instead of committing them
    #[arg(long)]
    discard_pending: bool,
}

pub async fn run(args: WatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(delay) = args.delay {
        config.buffer.commit_delay_secs = delay;
    }

    let mut service = open_service(&config, Utc::now())?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(config.buffer.tick_interval());

    eprintln!(
        "{} Watching stdin, commit delay {}s",
        style("ℹ").blue(),
        config.buffer.commit_delay_secs
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                service.tick(Utc::now());
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&mut service, &line),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    let pending = service.pending().len();
    if pending > 0 {
        if args.discard_pending {
            warn!(pending, "discarding pending reports");
        } else {
            let flush_at = Utc::now() + service.pending().delay();
            let committed = service.tick(flush_at).len();
            info!(committed, "flushed pending reports");
        }
    }

    Ok(())
}

fn handle_line(service: &mut CliService, line: &str) {
    match ChatEvent::parse_line(line) {
        Ok(Some(event)) => {
            let now = Utc::now();
            service.tick(now);
            let outcome = event.apply(service, now);
            info!(?outcome, "event applied");
        }
        Ok(None) => {}
        Err(e) => warn!("Skipping invalid event: {}", e),
    }
}
