//! Shift report data models.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::report::rules::numbers::round2;

/// Opaque chat message identifier.
pub type MessageId = i64;

/// A chat message as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Transport-assigned message id.
    pub id: MessageId,

    /// Display name of the author.
    pub author: String,

    /// Message text as typed.
    pub text: String,

    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(
        id: MessageId,
        author: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// A report field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Finished packaging units.
    Pieces,
    /// Produced weight, kg.
    Weight,
    /// Bag-sealing waste, kg.
    SealWaste,
    /// Flexography waste, kg.
    FlexoWaste,
    /// Extrusion waste (soft + hard), kg.
    ExtrusionWaste,
    /// Derived sum of the three waste fields.
    TotalWaste,
}

impl Field {
    /// All fields in persisted column order.
    pub const ALL: [Field; 6] = [
        Field::Pieces,
        Field::Weight,
        Field::SealWaste,
        Field::FlexoWaste,
        Field::ExtrusionWaste,
        Field::TotalWaste,
    ];

    /// Fields that contribute to the total waste.
    pub const WASTE: [Field; 3] = [Field::SealWaste, Field::FlexoWaste, Field::ExtrusionWaste];

    /// Fields that are read from message text.
    pub const PARSED: [Field; 5] = [
        Field::Pieces,
        Field::Weight,
        Field::SealWaste,
        Field::FlexoWaste,
        Field::ExtrusionWaste,
    ];

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Pieces => "pieces",
            Field::Weight => "weight",
            Field::SealWaste => "seal_waste",
            Field::FlexoWaste => "flexo_waste",
            Field::ExtrusionWaste => "extrusion_waste",
            Field::TotalWaste => "total_waste",
        }
    }

    /// Russian label used in chat replies and column headers.
    pub fn label(self) -> &'static str {
        match self {
            Field::Pieces => "Паков",
            Field::Weight => "Вес",
            Field::SealWaste => "Пакетосварка",
            Field::FlexoWaste => "Флекса",
            Field::ExtrusionWaste => "Экструзия",
            Field::TotalWaste => "Итого",
        }
    }

    /// Measurement unit shown next to the value.
    pub fn unit(self) -> &'static str {
        match self {
            Field::Pieces => "шт",
            _ => "кг",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed report values keyed by field.
///
/// Only detected fields are present until [`FieldMap::fill_defaults`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<Field, Decimal>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<Decimal> {
        self.0.get(&field).copied()
    }

    /// Value of `field`, or zero when absent.
    pub fn value(&self, field: Field) -> Decimal {
        self.get(field).unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, value: Decimal) {
        self.0.insert(field, round2(value.abs()));
    }

    /// Add `value` to `field`, creating it if absent.
    pub fn add(&mut self, field: Field, value: Decimal) {
        let current = self.value(field);
        self.insert(field, current + value.abs());
    }

    pub fn remove(&mut self, field: Field) -> Option<Decimal> {
        self.0.remove(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, Decimal)> + '_ {
        self.0.iter().map(|(field, value)| (*field, *value))
    }

    /// Number of fields that are present and non-zero.
    pub fn populated(&self) -> usize {
        self.0.values().filter(|v| !v.is_zero()).count()
    }

    /// Whether any field carries a non-zero value.
    pub fn has_nonzero(&self) -> bool {
        self.populated() > 0
    }

    /// Set every missing parsed field to zero.
    pub fn fill_defaults(&mut self) {
        for field in Field::PARSED {
            self.0.entry(field).or_insert(Decimal::ZERO);
        }
    }

    /// Overwrite the total waste with seal + flexo + extrusion.
    pub fn recompute_total(&mut self) {
        let total: Decimal = Field::WASTE.iter().map(|f| self.value(*f)).sum();
        self.insert(Field::TotalWaste, total);
    }

    /// Add every field of `other` into this map.
    pub fn accumulate(&mut self, other: &FieldMap) {
        for (field, value) in other.iter() {
            self.add(field, value);
        }
    }
}

impl FromIterator<(Field, Decimal)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (Field, Decimal)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

/// A calendar month used for file rotation and aggregate resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Period containing the given instant.
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        Period::of(at) == *self
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
