//! JSON-lines chat events consumed by `replay` and `watch`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shiftrep_core::models::report::{MessageId, RawMessage};
use shiftrep_core::service::{EditOutcome, MessageOutcome, Notifier, ReportService};
use shiftrep_core::storage::ReportStore;

/// One inbound chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A new message.
    Text {
        id: MessageId,
        author: String,
        text: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// An edit of an earlier message.
    Edited {
        id: MessageId,
        text: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// A deletion notice.
    Deleted {
        id: MessageId,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventOutcome {
    Message(MessageOutcome),
    Edit(EditOutcome),
    Deleted { cancelled: bool },
}

impl ChatEvent {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(line).map(Some)
    }

    pub fn id(&self) -> MessageId {
        match self {
            ChatEvent::Text { id, .. }
            | ChatEvent::Edited { id, .. }
            | ChatEvent::Deleted { id, .. } => *id,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            ChatEvent::Text { timestamp, .. }
            | ChatEvent::Edited { timestamp, .. }
            | ChatEvent::Deleted { timestamp, .. } => *timestamp,
        }
    }

    /// Feed the event to the service. Events without a timestamp happen at `now`.
    pub fn apply<S: ReportStore, N: Notifier>(
        self,
        service: &mut ReportService<S, N>,
        now: DateTime<Utc>,
    ) -> EventOutcome {
        let at = self.timestamp().unwrap_or(now);
        debug!(id = self.id(), %at, "applying event");

        match self {
            ChatEvent::Text {
                id, author, text, ..
            } => {
                let msg = RawMessage::new(id, author, text, at);
                EventOutcome::Message(service.on_text_message(&msg))
            }
            ChatEvent::Edited { id, text, .. } => {
                EventOutcome::Edit(service.on_edited_message(id, &text, at))
            }
            ChatEvent::Deleted { id, .. } => EventOutcome::Deleted {
                cancelled: service.on_deleted_message(id),
            },
        }
    }
}
