use crate::domain::values::cursor_pointer::CursorPointer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message as delivered by an ingestion source. An edit arrives as a
/// new snapshot under the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub author_id: String,
    #[serde(default)]
    pub author_display_name: String,
    pub channel_id: String,
    pub observed_at: DateTime<Utc>,
    /// Number of text edits the store has seen for this `id`. Assigned on
    /// ingest; whatever a source sends here is ignored.
    #[serde(default)]
    pub revision: u64,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author_id: author_id.into(),
            author_display_name: String::new(),
            channel_id: channel_id.into(),
            observed_at,
            revision: 0,
        }
    }

    pub fn pointer(&self) -> CursorPointer {
        CursorPointer::new(self.observed_at, self.id.clone())
    }

    /// Empty or too-short text is skipped without being treated as an error.
    pub fn is_malformed(&self, min_len: usize) -> bool {
        self.text.trim().chars().count() < min_len
    }
}
