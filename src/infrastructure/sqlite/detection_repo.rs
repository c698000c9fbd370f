use super::{db_err, lock, parse_ts, ts, SharedConnection};
use crate::domain::entities::detection::Detection;
use crate::domain::error::DomainError;
use crate::domain::ports::detection_repository::{DetectionFilter, DetectionRepository};
use crate::domain::values::extraction_method::ExtractionMethod;
use crate::domain::values::rule_outcome::RuleOutcome;
use rusqlite::params;
use tracing::warn;

const SELECT_COLS: &str = "id, message_id, channel_id, author_id, symbol, extraction_method, final_confidence, context_strength, position, detected_text, exchange, observed_at, created_at";

pub struct SqliteDetectionRepo {
    conn: SharedConnection,
}

impl SqliteDetectionRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_detection(row: &rusqlite::Row) -> Result<Detection, rusqlite::Error> {
        let method_str: String = row.get(5)?;
        let position: i64 = row.get(8)?;
        let observed_str: String = row.get(11)?;
        let created_str: String = row.get(12)?;

        Ok(Detection {
            id: row.get(0)?,
            message_id: row.get(1)?,
            channel_id: row.get(2)?,
            author_id: row.get(3)?,
            symbol: row.get(4)?,
            extraction_method: method_str.parse().unwrap_or_else(|_| {
                warn!(method = %method_str, "invalid extraction method in detection, defaulting to all_caps");
                ExtractionMethod::AllCaps
            }),
            final_confidence: row.get(6)?,
            context_strength: row.get(7)?,
            position: position.max(0) as usize,
            detected_text: row.get(9)?,
            exchange: row.get(10)?,
            observed_at: parse_ts(&observed_str, 11)?,
            created_at: parse_ts(&created_str, 12)?,
        })
    }
}

impl DetectionRepository for SqliteDetectionRepo {
    fn record(&self, detection: &Detection) -> Result<bool, DomainError> {
        let conn = lock(&self.conn)?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO detections (id, message_id, channel_id, author_id, symbol, extraction_method, final_confidence, context_strength, position, detected_text, exchange, rule_outcome, observed_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    detection.id,
                    detection.message_id,
                    detection.channel_id,
                    detection.author_id,
                    detection.symbol,
                    detection.extraction_method.to_string(),
                    detection.final_confidence,
                    detection.context_strength,
                    detection.position as i64,
                    detection.detected_text,
                    detection.exchange,
                    RuleOutcome::Accepted.to_string(),
                    ts(&detection.observed_at),
                    ts(&detection.created_at),
                ],
            )
            .map_err(|e| db_err("Failed to record detection", e))?;
        Ok(inserted > 0)
    }

    fn query(&self, filter: &DetectionFilter) -> Result<Vec<Detection>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut sql = format!("SELECT {SELECT_COLS} FROM detections WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(symbol) = &filter.symbol {
            sql.push_str(&format!(" AND symbol = ?{}", param_values.len() + 1));
            param_values.push(Box::new(symbol.to_uppercase()));
        }
        if let Some(message_id) = &filter.message_id {
            sql.push_str(&format!(" AND message_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(message_id.clone()));
        }
        if let Some(since) = &filter.since {
            sql.push_str(&format!(" AND observed_at >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(ts(since)));
        }
        if let Some(until) = &filter.until {
            sql.push_str(&format!(" AND observed_at < ?{}", param_values.len() + 1));
            param_values.push(Box::new(ts(until)));
        }
        sql.push_str(" ORDER BY observed_at DESC, message_id, position");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| db_err("Failed to query detections", e))?;
        let detections = stmt
            .query_map(params_refs.as_slice(), Self::row_to_detection)
            .map_err(|e| db_err("Failed to query detections", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(detections)
    }

    fn count(&self) -> Result<usize, DomainError> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM detections", [], |row| row.get(0))
            .map_err(|e| db_err("Failed to count detections", e))?;
        Ok(count as usize)
    }
}
