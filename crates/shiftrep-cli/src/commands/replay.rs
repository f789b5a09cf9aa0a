//! Replay command - feed a JSONL file of chat events through the service.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use tracing::{debug, info};

use shiftrep_core::service::{CommitOutcome, MessageOutcome, Notifier, ReportService};
use shiftrep_core::storage::{MemoryReportStore, ReportStore};

use super::{load_config, open_service};
use crate::events::{ChatEvent, EventOutcome};
use crate::notifier::TerminalNotifier;

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// JSONL file with one chat event per line
    #[arg(required = true)]
    input: PathBuf,

    /// Keep committed rows in memory instead of writing period files
    #[arg(long)]
    dry_run: bool,

    /// Print per-author statistics after the replay
    #[arg(long)]
    stats: bool,
}

/// Counters for the closing summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub rejected: usize,
    pub committed: usize,
    pub failed: usize,
}

impl ReplaySummary {
    fn count_commits(&mut self, commits: &[CommitOutcome]) {
        for commit in commits {
            match commit {
                CommitOutcome::Committed { .. } => self.committed += 1,
                CommitOutcome::Failed { .. } => self.failed += 1,
            }
        }
    }
}

pub async fn run(args: ReplayArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let content = fs::read_to_string(&args.input)?;

    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let event = ChatEvent::parse_line(line)
            .with_context(|| format!("{}:{}: invalid event", args.input.display(), index + 1))?;
        events.extend(event);
    }
    info!("Loaded {} events from {}", events.len(), args.input.display());

    let start = events
        .iter()
        .find_map(ChatEvent::timestamp)
        .unwrap_or_else(Utc::now);

    let (summary, stats) = if args.dry_run {
        let mut service = ReportService::new(
            &config,
            MemoryReportStore::new(),
            TerminalNotifier::new(),
            start,
        )?;
        let summary = replay(&mut service, events, start);
        (summary, service.stats_summary())
    } else {
        let mut service = open_service(&config, start)?;
        let summary = replay(&mut service, events, start);
        (summary, service.stats_summary())
    };

    println!(
        "{} Replayed {} events: {} committed, {} failed, {} rejected",
        style("✓").green(),
        summary.events,
        style(summary.committed).green(),
        style(summary.failed).red(),
        summary.rejected
    );
    if args.dry_run {
        println!("{} Dry run, no period files written", style("ℹ").blue());
    }
    if args.stats {
        println!();
        println!("{stats}");
    }

    Ok(())
}

/// Apply events in order using their timestamps as the clock, then flush.
pub fn replay<S: ReportStore, N: Notifier>(
    service: &mut ReportService<S, N>,
    events: Vec<ChatEvent>,
    start: DateTime<Utc>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    let mut clock = start;

    for event in events {
        if let Some(at) = event.timestamp() {
            clock = clock.max(at);
        }
        let commits = service.tick(clock);
        summary.count_commits(&commits);

        let outcome = event.apply(service, clock);
        debug!(?outcome, "event applied");
        if matches!(outcome, EventOutcome::Message(MessageOutcome::Rejected { .. })) {
            summary.rejected += 1;
        }
        summary.events += 1;
    }

    let flush_at = clock + service.pending().delay();
    let commits = service.tick(flush_at);
    summary.count_commits(&commits);

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use shiftrep_core::models::config::ShiftrepConfig;
    use shiftrep_core::models::report::{Field, Period};
    use shiftrep_core::service::RecordingNotifier;

    const REPORT: &str = "Паков 120\nВес 350\nПакетосварка 12\nФлекса 5\nЭкструзия\nмягкие 3\nтвердые 2";

    fn text(id: i64, body: &str, at: DateTime<Utc>) -> ChatEvent {
        ChatEvent::Text {
            id,
            author: "Иван".to_string(),
            text: body.to_string(),
            timestamp: Some(at),
        }
    }

    #[test]
    fn test_replay_commits_final_edit() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut config = ShiftrepConfig::default();
        config.buffer.commit_delay_secs = 120;
        let mut service =
            ReportService::new(&config, MemoryReportStore::new(), RecordingNotifier::new(), t0)
                .unwrap();

        let events = vec![
            text(1, REPORT, t0),
            ChatEvent::Edited {
                id: 1,
                text: REPORT.replace("Вес 350", "Вес 360"),
                timestamp: Some(t0 + TimeDelta::seconds(90)),
            },
            text(2, "всем привет", t0 + TimeDelta::seconds(100)),
        ];

        let summary = replay(&mut service, events, t0);

        assert_eq!(
            summary,
            ReplaySummary {
                events: 3,
                rejected: 1,
                committed: 1,
                failed: 0
            }
        );
        let rows = service.store().rows(Period::new(2024, 5));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields().value(Field::Weight).to_string(), "360");
    }
}
