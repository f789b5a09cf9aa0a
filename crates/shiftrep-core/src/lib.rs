//! Core library for free-text shift report processing.
//!
//! This crate provides:
//! - Field extraction from chat messages (pieces, weight, waste per section)
//! - Extrusion soft/hard sub-line scanning
//! - A debounced buffer that commits reports once edits settle
//! - Monthly CSV period files and per-author aggregates

pub mod error;
pub mod models;
pub mod pending;
pub mod report;
pub mod service;
pub mod stats;
pub mod storage;

pub use error::{NotifyError, Result, ShiftrepError, StorageError};
pub use models::config::ShiftrepConfig;
pub use models::report::{Field, FieldMap, MessageId, Period, RawMessage};
pub use pending::{PendingEntry, PendingReportBuffer};
pub use report::{LineReportParser, ParseResult, ReportDecision, ReportParser};
pub use service::{
    format_confirmation, CommitOutcome, EditOutcome, MessageOutcome, Notifier, RecordingNotifier,
    ReportService,
};
pub use stats::{AggregateStore, UserAggregate};
pub use storage::{CsvReportStore, MemoryReportStore, ReportRow, ReportStore};
