use crate::domain::entities::message::Message;
use crate::domain::error::DomainError;
use crate::domain::values::cursor_pointer::CursorPointer;
use chrono::{DateTime, Utc};

/// Source channel id that matches every channel.
pub const ALL_CHANNELS: &str = "all";

/// Polling side of the ingestion boundary.
pub trait MessageSource: Send + Sync {
    /// Messages strictly after `after`, oldest first.
    fn fetch_after(
        &self,
        source_id: &str,
        after: &CursorPointer,
        limit: usize,
    ) -> Result<Vec<Message>, DomainError>;

    /// Messages in `[since, through]` whose text was edited after
    /// `source_id` last processed them, oldest first.
    fn fetch_edits(
        &self,
        source_id: &str,
        since: DateTime<Utc>,
        through: &CursorPointer,
        limit: usize,
    ) -> Result<Vec<Message>, DomainError>;

    /// Record that `source_id` has processed `message` at its revision.
    fn mark_processed(&self, source_id: &str, message: &Message) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MentionSample {
    pub message_id: String,
    pub text: String,
    pub observed_at: DateTime<Utc>,
}

/// Recent messages mentioning a symbol, newest first.
pub trait MentionHistory: Send + Sync {
    /// Mentions observed within `[since, until]`. `until` is the evaluated
    /// message's own timestamp, so later chatter never counts as evidence.
    fn recent_mentions(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        exclude_message_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MentionSample>, DomainError>;
}
