use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resume point of an ingestion source.
///
/// Ordered by source timestamp first, then by message id so that messages
/// sharing a timestamp still have a total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CursorPointer {
    pub observed_at: DateTime<Utc>,
    pub message_id: String,
}

impl CursorPointer {
    pub fn new(observed_at: DateTime<Utc>, message_id: impl Into<String>) -> Self {
        Self {
            observed_at,
            message_id: message_id.into(),
        }
    }

    /// Default pointer when a source has never been processed: the start of
    /// the catch-up window.
    pub fn start_of_window(now: DateTime<Utc>, catch_up_window_hours: u32) -> Self {
        Self {
            observed_at: now - Duration::hours(catch_up_window_hours as i64),
            message_id: String::new(),
        }
    }

    /// Fixed-width timestamp so stored values sort lexicographically.
    pub fn timestamp_key(&self) -> String {
        self.observed_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl fmt::Display for CursorPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.timestamp_key(), self.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_orders_by_time_then_id() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let t1 = t0 + Duration::seconds(1);
        assert!(CursorPointer::new(t0, "9") < CursorPointer::new(t1, "1"));
        assert!(CursorPointer::new(t0, "1") < CursorPointer::new(t0, "2"));
    }

    #[test]
    fn test_start_of_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let start = CursorPointer::start_of_window(now, 24);
        assert_eq!(start.observed_at, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert!(start.message_id.is_empty());
    }
}
