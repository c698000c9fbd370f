use chrono::{DateTime, Utc};
use serde::Serialize;

/// Audit row for one arbitration verdict. `reasoning` is kept for humans only.
#[derive(Debug, Clone, Serialize)]
pub struct ArbitrationRecord {
    pub id: String,
    pub symbol: String,
    pub message_id: String,
    pub provider: String,
    pub is_genuine_stock: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}
