//! CSV period files.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{ReportRow, ReportStore, HEADERS};
use crate::error::StorageError;
use crate::models::report::{FieldMap, Period};

/// Report store writing `<data_dir>/<YYYY-MM>.csv`.
#[derive(Debug, Clone)]
pub struct CsvReportStore {
    data_dir: PathBuf,
}

impl CsvReportStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read every row of a period file.
    pub fn read_rows(path: &Path) -> Result<Vec<ReportRow>, StorageError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<ReportRow>() {
            let row = record.map_err(|e| StorageError::InvalidRow {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn write_rows(path: &Path, rows: &[ReportRow]) -> Result<(), StorageError> {
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&tmp)?;
            writer.write_record(HEADERS)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ReportStore for CsvReportStore {
    fn persist_entry(
        &mut self,
        at: DateTime<Utc>,
        author: &str,
        fields: &FieldMap,
    ) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.period_file(Period::of(at));

        let is_new = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(HEADERS)?;
        }
        writer.serialize(ReportRow::new(at, author, fields))?;
        writer.flush()?;

        debug!(path = %path.display(), author, "row appended");
        Ok(())
    }

    fn load_period(&self, period: Period) -> Result<Vec<ReportRow>, StorageError> {
        let path = self.period_file(period);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Self::read_rows(&path)
    }

    fn replace_period(&mut self, period: Period, rows: &[ReportRow]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.period_file(period);
        Self::write_rows(&path, rows)?;
        info!(path = %path.display(), rows = rows.len(), "period file replaced");
        Ok(())
    }

    fn reset_period(&mut self, period: Period) -> Result<(), StorageError> {
        let path = self.period_file(period);
        if path.exists() {
            fs::remove_file(&path)?;
            info!(path = %path.display(), "period file removed");
        }
        Ok(())
    }

    fn period_file(&self, period: Period) -> PathBuf {
        self.data_dir.join(format!("{period}.csv"))
    }
}
