//! Period file persistence.
//!
//! Committed reports are appended as rows to one file per calendar month. The
//! month is taken from the report's own timestamp, so a report submitted on
//! the 31st and committed after midnight still lands in the earlier file.

mod csv_store;
mod memory;

pub use csv_store::CsvReportStore;
pub use memory::MemoryReportStore;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StorageError;
use crate::models::report::{Field, FieldMap, Period};
use crate::report::rules::numbers::parse_number;

/// Date format of the first column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Column headers, in order.
pub const HEADERS: [&str; 8] = [
    "Дата",
    "Имя",
    "Паков",
    "Вес",
    "Пакетосварка",
    "Флекса",
    "Экструзия",
    "Итого",
];

/// One persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Дата", with = "row_date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Имя")]
    pub author: String,
    #[serde(rename = "Паков", deserialize_with = "lenient_decimal")]
    pub pieces: Decimal,
    #[serde(rename = "Вес", deserialize_with = "lenient_decimal")]
    pub weight: Decimal,
    #[serde(rename = "Пакетосварка", deserialize_with = "lenient_decimal")]
    pub seal_waste: Decimal,
    #[serde(rename = "Флекса", deserialize_with = "lenient_decimal")]
    pub flexo_waste: Decimal,
    #[serde(rename = "Экструзия", deserialize_with = "lenient_decimal")]
    pub extrusion_waste: Decimal,
    #[serde(rename = "Итого", deserialize_with = "lenient_decimal")]
    pub total_waste: Decimal,
}

impl ReportRow {
    /// Build a row from a committed field map.
    pub fn new(date: DateTime<Utc>, author: impl Into<String>, fields: &FieldMap) -> Self {
        Self {
            date,
            author: author.into(),
            pieces: fields.value(Field::Pieces),
            weight: fields.value(Field::Weight),
            seal_waste: fields.value(Field::SealWaste),
            flexo_waste: fields.value(Field::FlexoWaste),
            extrusion_waste: fields.value(Field::ExtrusionWaste),
            total_waste: fields.value(Field::TotalWaste),
        }
    }

    /// Field map of this row, total included as stored.
    pub fn fields(&self) -> FieldMap {
        [
            (Field::Pieces, self.pieces),
            (Field::Weight, self.weight),
            (Field::SealWaste, self.seal_waste),
            (Field::FlexoWaste, self.flexo_waste),
            (Field::ExtrusionWaste, self.extrusion_waste),
            (Field::TotalWaste, self.total_waste),
        ]
        .into_iter()
        .collect()
    }

    pub fn period(&self) -> Period {
        Period::of(self.date)
    }
}

/// Persistence collaborator used at commit time.
pub trait ReportStore {
    /// Append one committed report to the file of its period.
    fn persist_entry(
        &mut self,
        at: DateTime<Utc>,
        author: &str,
        fields: &FieldMap,
    ) -> Result<(), StorageError>;

    /// All rows of a period; empty when nothing was stored.
    fn load_period(&self, period: Period) -> Result<Vec<ReportRow>, StorageError>;

    /// Replace the rows of a period.
    fn replace_period(&mut self, period: Period, rows: &[ReportRow]) -> Result<(), StorageError>;

    /// Delete everything stored for a period.
    fn reset_period(&mut self, period: Period) -> Result<(), StorageError>;

    /// Location of the period file.
    fn period_file(&self, period: Period) -> PathBuf;
}

/// Parse a date cell. Accepts the native format and a few older layouts.
pub fn parse_row_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [DATE_FORMAT, "%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

mod row_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_row_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw:?}")))
    }
}

fn lenient_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(parse_number(&raw).unwrap_or(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_row_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();

        assert_eq!(parse_row_date("2024-05-01 08:30"), Some(expected));
        assert_eq!(parse_row_date("2024-05-01 08:30:00"), Some(expected));
        assert_eq!(parse_row_date("2024-05-01T08:30:00Z"), Some(expected));
        assert_eq!(parse_row_date("01.05.2024 08:30"), Some(expected));
        assert_eq!(
            parse_row_date("01.05.2024"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_row_date("вчера"), None);
    }

    #[test]
    fn test_row_fields_round_trip_through_map() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let mut fields: FieldMap = [(Field::SealWaste, Decimal::from(12))].into_iter().collect();
        fields.fill_defaults();
        fields.recompute_total();

        let row = ReportRow::new(at, "Иван", &fields);
        assert_eq!(row.total_waste, Decimal::from(12));
        assert_eq!(row.fields(), fields);
        assert_eq!(row.period(), Period::new(2024, 5));
    }
}
