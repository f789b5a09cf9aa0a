//! In-memory report store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::{ReportRow, ReportStore};
use crate::error::StorageError;
use crate::models::report::{FieldMap, Period};

/// Report store that keeps rows in memory.
///
/// Used for dry runs and tests; [`fail_next`](Self::fail_next) makes the next
/// persist call fail.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    periods: BTreeMap<Period, Vec<ReportRow>>,
    fail_next: Option<String>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `persist_entry` call fail with `reason`.
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    /// Rows stored for a period.
    pub fn rows(&self, period: Period) -> &[ReportRow] {
        self.periods.get(&period).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of rows across all periods.
    pub fn total_rows(&self) -> usize {
        self.periods.values().map(Vec::len).sum()
    }
}

impl ReportStore for MemoryReportStore {
    fn persist_entry(
        &mut self,
        at: DateTime<Utc>,
        author: &str,
        fields: &FieldMap,
    ) -> Result<(), StorageError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(StorageError::Injected(reason));
        }
        self.periods
            .entry(Period::of(at))
            .or_default()
            .push(ReportRow::new(at, author, fields));
        Ok(())
    }

    fn load_period(&self, period: Period) -> Result<Vec<ReportRow>, StorageError> {
        Ok(self.rows(period).to_vec())
    }

    fn replace_period(&mut self, period: Period, rows: &[ReportRow]) -> Result<(), StorageError> {
        self.periods.insert(period, rows.to_vec());
        Ok(())
    }

    fn reset_period(&mut self, period: Period) -> Result<(), StorageError> {
        self.periods.remove(&period);
        Ok(())
    }

    fn period_file(&self, period: Period) -> PathBuf {
        PathBuf::from("memory").join(format!("{period}.csv"))
    }
}
