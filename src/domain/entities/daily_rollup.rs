use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Per-symbol statistics for one UTC calendar date. Derived from detections
/// and recomputable at any time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRollup {
    pub symbol: String,
    pub calendar_date: NaiveDate,
    pub mention_count: u64,
    pub unique_authors: u64,
    pub avg_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}
