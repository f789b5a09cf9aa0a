//! Debounced report buffer.
//!
//! Accepted reports wait here until `delay` has passed since their last edit.
//! Deadlines live in a min-heap polled by [`PendingReportBuffer::tick`]; an
//! amend pushes a fresh heap item and bumps the entry's generation, so older
//! items for the same message are skipped when they surface.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::models::report::{FieldMap, MessageId};

/// A report waiting for its commit deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEntry {
    /// Message the report came from.
    pub message_id: MessageId,
    /// Report author.
    pub author: String,
    /// Latest accepted field map.
    pub fields: FieldMap,
    /// Timestamp of the original message; the report's own date.
    pub submitted_at: DateTime<Utc>,
    /// Timestamp of the latest submit or amend.
    pub updated_at: DateTime<Utc>,
    /// When the entry becomes due.
    pub deadline: DateTime<Utc>,
    #[serde(skip)]
    generation: u64,
}

/// Buffer of reports pending commit.
#[derive(Debug)]
pub struct PendingReportBuffer {
    delay: TimeDelta,
    entries: HashMap<MessageId, PendingEntry>,
    queue: BinaryHeap<Reverse<(DateTime<Utc>, MessageId, u64)>>,
    next_generation: u64,
}

impl PendingReportBuffer {
    pub fn new(delay: TimeDelta) -> Self {
        Self {
            delay,
            entries: HashMap::new(),
            queue: BinaryHeap::new(),
            next_generation: 0,
        }
    }

    pub fn delay(&self) -> TimeDelta {
        self.delay
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&PendingEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Pending entries ordered by deadline.
    pub fn entries(&self) -> Vec<&PendingEntry> {
        let mut entries: Vec<&PendingEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| (e.deadline, e.message_id));
        entries
    }

    /// Buffer a new report. Resubmitting a pending id replaces it.
    pub fn submit(
        &mut self,
        id: MessageId,
        author: impl Into<String>,
        fields: FieldMap,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let deadline = now + self.delay;
        let generation = self.bump_generation();

        let author = author.into();
        match self.entries.get_mut(&id) {
            Some(entry) => {
                debug!(message_id = id, "resubmitted pending report");
                entry.author = author;
                entry.fields = fields;
                entry.updated_at = now;
                entry.deadline = deadline;
                entry.generation = generation;
            }
            None => {
                debug!(message_id = id, %deadline, "report buffered");
                self.entries.insert(
                    id,
                    PendingEntry {
                        message_id: id,
                        author,
                        fields,
                        submitted_at: now,
                        updated_at: now,
                        deadline,
                        generation,
                    },
                );
            }
        }

        self.queue.push(Reverse((deadline, id, generation)));
        deadline
    }

    /// Replace a pending report and restart its debounce window.
    ///
    /// Returns `false` when the id is not pending (never seen, committed or
    /// cancelled); nothing is created in that case.
    pub fn amend(&mut self, id: MessageId, fields: FieldMap, now: DateTime<Utc>) -> bool {
        let deadline = now + self.delay;
        let generation = self.next_generation + 1;

        let Some(entry) = self.entries.get_mut(&id) else {
            debug!(message_id = id, "amend ignored, report not pending");
            return false;
        };

        entry.fields = fields;
        entry.updated_at = now;
        entry.deadline = deadline;
        entry.generation = generation;
        self.next_generation = generation;

        self.queue.push(Reverse((deadline, id, generation)));
        debug!(message_id = id, %deadline, "pending report amended");
        true
    }

    /// Drop a pending report without committing it.
    pub fn cancel(&mut self, id: MessageId) -> Option<PendingEntry> {
        let removed = self.entries.remove(&id);
        if removed.is_some() {
            debug!(message_id = id, "pending report cancelled");
        }
        removed
    }

    /// Remove and return every entry whose deadline is at or before `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<PendingEntry> {
        let mut due = Vec::new();

        while let Some(Reverse((deadline, id, generation))) = self.queue.peek().copied() {
            if deadline > now {
                break;
            }
            self.queue.pop();

            let live = self
                .entries
                .get(&id)
                .is_some_and(|entry| entry.generation == generation);
            if !live {
                trace!(message_id = id, generation, "skipping stale deadline");
                continue;
            }

            if let Some(entry) = self.entries.remove(&id) {
                due.push(entry);
            }
        }

        if !due.is_empty() {
            debug!(count = due.len(), "pending reports due");
        }
        due
    }

    /// Earliest deadline among live entries.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|e| e.deadline).min()
    }

    /// Discard every pending entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.queue.clear();
        dropped
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Field;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn secs(s: i64) -> DateTime<Utc> {
        t0() + TimeDelta::seconds(s)
    }

    fn fields(weight: i64) -> FieldMap {
        [(Field::Weight, Decimal::from(weight))].into_iter().collect()
    }

    fn buffer() -> PendingReportBuffer {
        PendingReportBuffer::new(TimeDelta::minutes(2))
    }

    #[test]
    fn test_commits_after_delay() {
        let mut buf = buffer();
        let deadline = buf.submit(1, "Иван", fields(350), t0());

        assert_eq!(deadline, secs(120));
        assert!(buf.tick(secs(119)).is_empty());

        let due = buf.tick(secs(120));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].fields, fields(350));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_amend_restarts_window() {
        let mut buf = buffer();
        buf.submit(1, "Иван", fields(350), t0());

        assert!(buf.amend(1, fields(360), secs(90)));
        assert_eq!(buf.get(1).map(|e| e.deadline), Some(secs(210)));
        assert!(buf.tick(secs(120)).is_empty());
        assert!(buf.tick(secs(209)).is_empty());

        let due = buf.tick(secs(210));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].fields, fields(360));
        assert_eq!(due[0].submitted_at, t0());
        assert_eq!(due[0].updated_at, secs(90));

        assert!(buf.tick(secs(1000)).is_empty());
    }

    #[test]
    fn test_cancel_wins() {
        let mut buf = buffer();
        buf.submit(1, "Иван", fields(350), t0());

        assert!(buf.cancel(1).is_some());
        assert!(buf.tick(secs(120)).is_empty());
        assert!(buf.cancel(1).is_none());
    }

    #[test]
    fn test_amend_after_commit_is_noop() {
        let mut buf = buffer();
        buf.submit(1, "Иван", fields(350), t0());
        assert_eq!(buf.tick(secs(120)).len(), 1);

        assert!(!buf.amend(1, fields(400), secs(130)));
        assert!(!buf.contains(1));
        assert!(buf.tick(secs(1000)).is_empty());
    }

    #[test]
    fn test_amend_unknown_is_noop() {
        let mut buf = buffer();
        assert!(!buf.amend(42, fields(1), t0()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_resubmit_replaces_entry() {
        let mut buf = buffer();
        buf.submit(1, "Иван", fields(350), t0());
        buf.submit(1, "Пётр", fields(10), secs(60));

        assert_eq!(buf.len(), 1);
        assert!(buf.tick(secs(120)).is_empty());

        let due = buf.tick(secs(180));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].author, "Пётр");
        assert_eq!(due[0].submitted_at, t0());
    }

    #[test]
    fn test_tick_orders_by_deadline() {
        let mut buf = buffer();
        buf.submit(2, "b", fields(2), secs(10));
        buf.submit(1, "a", fields(1), t0());
        buf.submit(3, "c", fields(3), secs(500));

        let due = buf.tick(secs(300));
        let ids: Vec<MessageId> = due.iter().map(|e| e.message_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(buf.next_deadline(), Some(secs(620)));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut buf = buffer();
        buf.submit(1, "a", fields(1), t0());
        buf.submit(2, "b", fields(2), t0());

        assert_eq!(buf.clear(), 2);
        assert!(buf.tick(secs(1000)).is_empty());
        assert_eq!(buf.next_deadline(), None);
    }
}
