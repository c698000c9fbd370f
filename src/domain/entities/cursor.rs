use crate::domain::values::cursor_pointer::CursorPointer;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Durable progress of one ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingCursor {
    pub source_id: String,
    pub pointer: CursorPointer,
    pub messages_processed_count: u64,
    pub detections_count: u64,
    pub error_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// Counter increments applied together with a cursor advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorDelta {
    pub messages: u64,
    pub detections: u64,
    pub errors: u64,
}

impl CursorDelta {
    pub fn message(detections: u64) -> Self {
        Self {
            messages: 1,
            detections,
            errors: 0,
        }
    }

    pub fn failed_message() -> Self {
        Self {
            messages: 1,
            detections: 0,
            errors: 1,
        }
    }
}
