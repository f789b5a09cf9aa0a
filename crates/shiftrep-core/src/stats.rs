//! Per-author running totals for the active period.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::models::report::{Field, FieldMap, Period};
use crate::storage::ReportRow;

/// Running totals for one author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAggregate {
    /// Summed field values.
    pub fields: FieldMap,
    /// Number of committed reports.
    pub shifts: u32,
}

/// Aggregates of committed reports, keyed by author.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStore {
    period: Period,
    users: BTreeMap<String, UserAggregate>,
}

impl AggregateStore {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            users: BTreeMap::new(),
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Add one committed report.
    pub fn record(&mut self, author: &str, fields: &FieldMap) {
        let user = self.users.entry(author.to_string()).or_default();
        user.fields.accumulate(fields);
        user.shifts += 1;
    }

    pub fn get(&self, author: &str) -> Option<&UserAggregate> {
        self.users.get(author)
    }

    pub fn by_author(&self) -> &BTreeMap<String, UserAggregate> {
        &self.users
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Drop all totals and start `period`.
    pub fn reset(&mut self, period: Period) {
        info!(from = %self.period, to = %period, authors = self.users.len(), "aggregates reset");
        self.period = period;
        self.users.clear();
    }

    /// Reset to `period` and replay persisted rows.
    pub fn rebuild<'a>(&mut self, period: Period, rows: impl IntoIterator<Item = &'a ReportRow>) {
        self.period = period;
        self.users.clear();
        for row in rows {
            if row.author.trim().is_empty() {
                continue;
            }
            self.record(&row.author, &row.fields());
        }
    }

    /// Human-readable summary for the stats command.
    pub fn render_summary(&self) -> String {
        if self.users.is_empty() {
            return "📊 Статистика пуста.".to_string();
        }

        let mut blocks = vec![format!("📊 Статистика по пользователям ({}):", self.period)];
        for (author, user) in &self.users {
            let mut block = format!("{author}:");
            for (icon, field) in [
                ("📦", Field::Pieces),
                ("⚖️", Field::Weight),
                ("🛍️", Field::SealWaste),
                ("🎨", Field::FlexoWaste),
                ("🧵", Field::ExtrusionWaste),
            ] {
                block.push_str(&format!(
                    "\n  {icon} {}: {:.2} {}",
                    field.label(),
                    user.fields.value(field),
                    field.unit()
                ));
            }
            block.push_str(&format!(
                "\n  🧾 Итого отходов: {:.2} кг\n  🗓 Смен: {}",
                user.fields.value(Field::TotalWaste),
                user.shifts
            ));
            blocks.push(block);
        }
        blocks.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn report(pieces: i64, seal: i64) -> FieldMap {
        let mut fields: FieldMap = [
            (Field::Pieces, Decimal::from(pieces)),
            (Field::SealWaste, Decimal::from(seal)),
        ]
        .into_iter()
        .collect();
        fields.fill_defaults();
        fields.recompute_total();
        fields
    }

    #[test]
    fn test_record_accumulates() {
        let mut store = AggregateStore::new(Period::new(2024, 5));
        store.record("Иван", &report(100, 2));
        store.record("Иван", &report(20, 3));
        store.record("Пётр", &report(5, 1));

        let ivan = store.get("Иван").unwrap();
        assert_eq!(ivan.shifts, 2);
        assert_eq!(ivan.fields.get(Field::Pieces), Some(Decimal::from(120)));
        assert_eq!(ivan.fields.get(Field::TotalWaste), Some(Decimal::from(5)));
        assert_eq!(store.by_author().len(), 2);
    }

    #[test]
    fn test_reset() {
        let mut store = AggregateStore::new(Period::new(2024, 5));
        store.record("Иван", &report(100, 2));

        store.reset(Period::new(2024, 6));
        assert!(store.is_empty());
        assert_eq!(store.period(), Period::new(2024, 6));
    }

    #[test]
    fn test_render_summary() {
        let mut store = AggregateStore::new(Period::new(2024, 5));
        assert_eq!(store.render_summary(), "📊 Статистика пуста.");

        store.record("Иван", &report(120, 12));
        let summary = store.render_summary();

        assert!(summary.starts_with("📊 Статистика по пользователям (2024-05):"));
        assert!(summary.contains("Иван:"));
        assert!(summary.contains("📦 Паков: 120.00 шт"));
        assert!(summary.contains("🧾 Итого отходов: 12.00 кг"));
        assert!(summary.contains("🗓 Смен: 1"));
    }
}
