use super::{db_err, lock, parse_ts, ts, SharedConnection};
use crate::domain::entities::cursor::{CursorDelta, ProcessingCursor};
use crate::domain::error::DomainError;
use crate::domain::ports::cursor_store::CursorStore;
use crate::domain::values::cursor_pointer::CursorPointer;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

const SELECT_COLS: &str = "source_id, last_observed_at, last_message_id, messages_processed_count, detections_count, error_count, updated_at";

pub struct SqliteCursorRepo {
    conn: SharedConnection,
}

impl SqliteCursorRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_cursor(row: &rusqlite::Row) -> Result<ProcessingCursor, rusqlite::Error> {
        let observed_str: String = row.get(1)?;
        let message_id: String = row.get(2)?;
        let processed: i64 = row.get(3)?;
        let detections: i64 = row.get(4)?;
        let errors: i64 = row.get(5)?;
        let updated_str: String = row.get(6)?;
        Ok(ProcessingCursor {
            source_id: row.get(0)?,
            pointer: CursorPointer::new(parse_ts(&observed_str, 1)?, message_id),
            messages_processed_count: processed.max(0) as u64,
            detections_count: detections.max(0) as u64,
            error_count: errors.max(0) as u64,
            updated_at: parse_ts(&updated_str, 6)?,
        })
    }
}

impl CursorStore for SqliteCursorRepo {
    fn load(&self, source_id: &str) -> Result<Option<ProcessingCursor>, DomainError> {
        let conn = lock(&self.conn)?;
        conn.query_row(
            &format!("SELECT {SELECT_COLS} FROM processing_cursors WHERE source_id = ?1"),
            params![source_id],
            Self::row_to_cursor,
        )
        .optional()
        .map_err(|e| db_err("Failed to load cursor", e))
    }

    fn advance(
        &self,
        source_id: &str,
        pointer: &CursorPointer,
        delta: CursorDelta,
    ) -> Result<bool, DomainError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| db_err("Failed to begin cursor update", e))?;

        let stored: Option<(String, String)> = tx
            .query_row(
                "SELECT last_observed_at, last_message_id FROM processing_cursors WHERE source_id = ?1",
                params![source_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| db_err("Failed to read cursor", e))?;

        // Compare in stored form so a round trip through the table is stable.
        let key = pointer.timestamp_key();
        let moved = stored
            .as_ref()
            .map_or(true, |(at, id)| (key.as_str(), pointer.message_id.as_str()) > (at.as_str(), id.as_str()));
        let now = ts(&Utc::now());

        match (&stored, moved) {
            (None, _) => {
                tx.execute(
                    "INSERT INTO processing_cursors (source_id, last_observed_at, last_message_id, messages_processed_count, detections_count, error_count, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        source_id,
                        key,
                        pointer.message_id,
                        delta.messages as i64,
                        delta.detections as i64,
                        delta.errors as i64,
                        now,
                    ],
                )
                .map_err(|e| db_err("Failed to create cursor", e))?;
            }
            (Some(_), true) => {
                tx.execute(
                    "UPDATE processing_cursors SET last_observed_at = ?2, last_message_id = ?3,
                        messages_processed_count = messages_processed_count + ?4,
                        detections_count = detections_count + ?5,
                        error_count = error_count + ?6,
                        updated_at = ?7
                     WHERE source_id = ?1",
                    params![
                        source_id,
                        key,
                        pointer.message_id,
                        delta.messages as i64,
                        delta.detections as i64,
                        delta.errors as i64,
                        now,
                    ],
                )
                .map_err(|e| db_err("Failed to advance cursor", e))?;
            }
            (Some(_), false) => {
                tx.execute(
                    "UPDATE processing_cursors SET
                        messages_processed_count = messages_processed_count + ?2,
                        detections_count = detections_count + ?3,
                        error_count = error_count + ?4,
                        updated_at = ?5
                     WHERE source_id = ?1",
                    params![
                        source_id,
                        delta.messages as i64,
                        delta.detections as i64,
                        delta.errors as i64,
                        now,
                    ],
                )
                .map_err(|e| db_err("Failed to update cursor counters", e))?;
            }
        }

        tx.commit().map_err(|e| db_err("Failed to commit cursor", e))?;
        Ok(moved)
    }

    fn list(&self) -> Result<Vec<ProcessingCursor>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLS} FROM processing_cursors ORDER BY source_id"
            ))
            .map_err(|e| db_err("Failed to list cursors", e))?;
        let cursors = stmt
            .query_map([], Self::row_to_cursor)
            .map_err(|e| db_err("Failed to list cursors", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(cursors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::open_database;
    use chrono::TimeZone;

    #[test]
    fn test_advance_and_reload() {
        let repo = SqliteCursorRepo::new(open_database(":memory:").unwrap());
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let pointer = CursorPointer::new(at, "m1");

        assert!(repo.advance("floor", &pointer, CursorDelta::message(2)).unwrap());
        let cursor = repo.load("floor").unwrap().unwrap();
        assert_eq!(cursor.pointer, pointer);
        assert_eq!(cursor.detections_count, 2);
    }

    #[test]
    fn test_corrupt_timestamp_fails_load() {
        let conn = open_database(":memory:").unwrap();
        let repo = SqliteCursorRepo::new(conn.clone());
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        repo.advance("floor", &CursorPointer::new(at, "m1"), CursorDelta::default())
            .unwrap();
        conn.lock()
            .unwrap()
            .execute(
                "UPDATE processing_cursors SET last_observed_at = 'not a time' WHERE source_id = 'floor'",
                [],
            )
            .unwrap();

        assert!(repo.load("floor").is_err());
    }
}
