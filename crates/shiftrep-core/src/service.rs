//! Report service: inbound message handling, debounced commits and stats.
//!
//! The service is synchronous and clock-agnostic. Callers pass `now`
//! explicitly and call [`ReportService::tick`] on a fixed interval.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{NotifyError, Result};
use crate::models::config::{NotifyConfig, ShiftrepConfig};
use crate::models::report::{Field, FieldMap, MessageId, Period, RawMessage};
use crate::pending::{PendingEntry, PendingReportBuffer};
use crate::report::{LineReportParser, ReportDecision, ReportParser};
use crate::stats::{AggregateStore, UserAggregate};
use crate::storage::{ReportRow, ReportStore};

/// Outbound chat channel.
pub trait Notifier {
    /// Send `text` to `target`.
    fn notify(&mut self, target: &str, text: &str) -> std::result::Result<(), NotifyError>;
}

/// Notifier that keeps every message, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub messages: Vec<(String, String)>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts sent so far, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|(_, text)| text.as_str()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, target: &str, text: &str) -> std::result::Result<(), NotifyError> {
        self.messages.push((target.to_string(), text.to_string()));
        Ok(())
    }
}

/// What happened to a new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Accepted and waiting for its commit deadline.
    Buffered { deadline: DateTime<Utc> },
    /// Not a shift report.
    Rejected { populated: usize },
}

/// What happened to an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// Pending report replaced, debounce restarted.
    Amended { deadline: DateTime<Utc> },
    /// The edited text is no longer a report; the pending entry was dropped.
    Cancelled,
    /// Unknown or already committed message.
    Ignored,
}

/// Result of committing one due report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed {
        message_id: MessageId,
        author: String,
        fields: FieldMap,
    },
    Failed {
        message_id: MessageId,
        author: String,
        error: String,
    },
}

/// Service layer owning the parser, buffer, aggregates and collaborators.
pub struct ReportService<S, N> {
    parser: LineReportParser,
    buffer: PendingReportBuffer,
    aggregates: AggregateStore,
    store: S,
    notifier: N,
    notify: NotifyConfig,
}

impl<S: ReportStore, N: Notifier> ReportService<S, N> {
    /// Create a service whose aggregates start in the period of `now`.
    ///
    /// Fails when the configured commit delay is out of range.
    pub fn new(config: &ShiftrepConfig, store: S, notifier: N, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            parser: LineReportParser::from_config(&config.parser),
            buffer: PendingReportBuffer::new(config.buffer.commit_delay()?),
            aggregates: AggregateStore::new(Period::of(now)),
            store,
            notifier,
            notify: config.notify.clone(),
        })
    }

    /// Reload the aggregates of the current period from the store.
    pub fn restore(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let period = Period::of(now);
        let rows = self.store.load_period(period)?;
        self.aggregates.rebuild(period, &rows);
        info!(%period, rows = rows.len(), "aggregates restored");
        Ok(rows.len())
    }

    /// Handle a new chat message.
    pub fn on_text_message(&mut self, msg: &RawMessage) -> MessageOutcome {
        self.check_period(msg.timestamp);

        match self.parser.parse_report(&msg.text) {
            ReportDecision::Accepted(fields) => {
                let deadline = self
                    .buffer
                    .submit(msg.id, msg.author.clone(), fields, msg.timestamp);
                info!(message_id = msg.id, author = %msg.author, %deadline, "report buffered");

                if self.notify.notify_on_receipt {
                    let text = format!(
                        "📝 Отчёт от {} получен, будет сохранён в {} UTC.",
                        msg.author,
                        deadline.format("%H:%M")
                    );
                    self.send(&text);
                }
                MessageOutcome::Buffered { deadline }
            }
            ReportDecision::Rejected { populated } => {
                debug!(message_id = msg.id, populated, "message is not a report");
                if self.notify.notify_unrecognized {
                    self.send("⚠️ Не удалось распознать отчёт.");
                }
                MessageOutcome::Rejected { populated }
            }
        }
    }

    /// Handle an edit of an earlier message.
    pub fn on_edited_message(&mut self, id: MessageId, text: &str, now: DateTime<Utc>) -> EditOutcome {
        self.check_period(now);

        if !self.buffer.contains(id) {
            debug!(message_id = id, "edit of a message that is not pending");
            return EditOutcome::Ignored;
        }

        match self.parser.parse_report(text) {
            ReportDecision::Accepted(fields) => {
                self.buffer.amend(id, fields, now);
                match self.buffer.get(id) {
                    Some(entry) => EditOutcome::Amended {
                        deadline: entry.deadline,
                    },
                    None => EditOutcome::Ignored,
                }
            }
            ReportDecision::Rejected { populated } => {
                info!(message_id = id, populated, "edited message is no longer a report");
                self.buffer.cancel(id);
                EditOutcome::Cancelled
            }
        }
    }

    /// Handle a deletion notice. Returns whether a pending report was dropped.
    pub fn on_deleted_message(&mut self, id: MessageId) -> bool {
        self.buffer.cancel(id).is_some()
    }

    /// Commit every report whose debounce window has elapsed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<CommitOutcome> {
        self.check_period(now);

        self.buffer
            .tick(now)
            .into_iter()
            .map(|entry| self.commit(entry))
            .collect()
    }

    fn commit(&mut self, entry: PendingEntry) -> CommitOutcome {
        let PendingEntry {
            message_id,
            author,
            fields,
            submitted_at,
            ..
        } = entry;

        // Persist first so the aggregates never count a row that was not stored.
        if let Err(e) = self.store.persist_entry(submitted_at, &author, &fields) {
            warn!(message_id, author = %author, error = %e, "failed to persist report");
            self.send(&format!(
                "❌ Не удалось сохранить отчёт от {author} (сообщение {message_id}): {e}"
            ));
            return CommitOutcome::Failed {
                message_id,
                author,
                error: e.to_string(),
            };
        }

        // The row went to the file of its own month; only that month's totals count it.
        let period = Period::of(submitted_at);
        if period == self.aggregates.period() {
            self.aggregates.record(&author, &fields);
        } else {
            info!(
                message_id,
                %period,
                current = %self.aggregates.period(),
                "report stored outside the current period, totals unchanged"
            );
        }
        info!(message_id, author = %author, "report committed");
        self.send(&format_confirmation(&author, &fields));

        CommitOutcome::Committed {
            message_id,
            author,
            fields,
        }
    }

    fn check_period(&mut self, now: DateTime<Utc>) {
        let period = Period::of(now);
        if period <= self.aggregates.period() {
            return;
        }

        let dropped = self.buffer.clear();
        if dropped > 0 {
            warn!(
                from = %self.aggregates.period(),
                to = %period,
                dropped,
                "period rolled over, discarding uncommitted reports"
            );
        }
        self.aggregates.reset(period);
    }

    fn send(&mut self, text: &str) {
        if let Err(e) = self.notifier.notify(&self.notify.target, text) {
            warn!(chat = %self.notify.target, error = %e, "notification failed");
        }
    }

    /// Accumulated totals per author for the current period.
    pub fn aggregate_by_author(&self) -> &BTreeMap<String, UserAggregate> {
        self.aggregates.by_author()
    }

    pub fn aggregates(&self) -> &AggregateStore {
        &self.aggregates
    }

    /// Text for the stats command.
    pub fn stats_summary(&self) -> String {
        self.aggregates.render_summary()
    }

    pub fn pending(&self) -> &PendingReportBuffer {
        &self.buffer
    }

    /// Period file for the export command.
    pub fn current_period_file(&self, now: DateTime<Utc>) -> PathBuf {
        self.store.period_file(Period::of(now))
    }

    /// Replace the current period with imported rows.
    ///
    /// Rows dated in other months are appended to their own period files.
    pub fn import_rows(&mut self, rows: Vec<ReportRow>, now: DateTime<Utc>) -> Result<usize> {
        let period = Period::of(now);
        let (current, other): (Vec<ReportRow>, Vec<ReportRow>) =
            rows.into_iter().partition(|row| row.period() == period);

        self.store.replace_period(period, &current)?;
        self.aggregates.rebuild(period, &current);
        for row in &other {
            self.store.persist_entry(row.date, &row.author, &row.fields())?;
        }

        let imported = current.len() + other.len();
        info!(%period, imported, other_periods = other.len(), "rows imported");
        Ok(imported)
    }

    /// Delete the current period's data and drop pending reports.
    pub fn reset_period(&mut self, now: DateTime<Utc>) -> Result<()> {
        let period = Period::of(now);
        self.store.reset_period(period)?;

        let dropped = self.buffer.clear();
        if dropped > 0 {
            warn!(%period, dropped, "reset discarded uncommitted reports");
        }
        self.aggregates.reset(period);
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

/// Confirmation text for a committed report.
pub fn format_confirmation(author: &str, fields: &FieldMap) -> String {
    format!(
        "✅ Принято от {author}:\n\
         📦 Паков: {}\n\
         ⚖️ Вес: {}\n\
         ♻️ Отходы:\n\
         \u{20} 🧵 Пакетосварка: {}\n\
         \u{20} 🎨 Флекса: {}\n\
         \u{20} 🏭 Экструзия: {}\n\
         ♻️ Итого отходов: {}",
        fields.value(Field::Pieces),
        fields.value(Field::Weight),
        fields.value(Field::SealWaste),
        fields.value(Field::FlexoWaste),
        fields.value(Field::ExtrusionWaste),
        fields.value(Field::TotalWaste),
    )
}
