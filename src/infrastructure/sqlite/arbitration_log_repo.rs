use super::{db_err, lock, parse_ts, ts, SharedConnection};
use crate::domain::entities::arbitration_record::ArbitrationRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::arbitration_log::ArbitrationLog;
use rusqlite::params;

pub struct SqliteArbitrationLog {
    conn: SharedConnection,
}

impl SqliteArbitrationLog {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl ArbitrationLog for SqliteArbitrationLog {
    fn record_verdict(&self, record: &ArbitrationRecord) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO arbitration_log (id, symbol, message_id, provider, is_genuine_stock, confidence, reasoning, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.symbol,
                record.message_id,
                record.provider,
                record.is_genuine_stock as i32,
                record.confidence,
                record.reasoning,
                ts(&record.created_at),
            ],
        )
        .map_err(|e| db_err("Failed to record verdict", e))?;
        Ok(())
    }

    fn recent(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<ArbitrationRecord>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, symbol, message_id, provider, is_genuine_stock, confidence, reasoning, created_at
                 FROM arbitration_log WHERE ?1 IS NULL OR symbol = ?1
                 ORDER BY created_at DESC LIMIT ?2",
            )
            .map_err(|e| db_err("Failed to load verdicts", e))?;
        let records = stmt
            .query_map(params![symbol.map(str::to_uppercase), limit as i64], |row| {
                let genuine: i32 = row.get(4)?;
                let created_str: String = row.get(7)?;
                Ok(ArbitrationRecord {
                    id: row.get(0)?,
                    symbol: row.get(1)?,
                    message_id: row.get(2)?,
                    provider: row.get(3)?,
                    is_genuine_stock: genuine != 0,
                    confidence: row.get(5)?,
                    reasoning: row.get(6)?,
                    created_at: parse_ts(&created_str, 7)?,
                })
            })
            .map_err(|e| db_err("Failed to load verdicts", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }
}
