use super::{db_err, lock, parse_ts, ts, SharedConnection};
use crate::domain::entities::daily_rollup::DailyRollup;
use crate::domain::error::DomainError;
use crate::domain::ports::rollup_repository::RollupRepository;
use chrono::NaiveDate;
use rusqlite::params;

pub struct SqliteRollupRepo {
    conn: SharedConnection,
}

impl SqliteRollupRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_rollup(row: &rusqlite::Row) -> Result<DailyRollup, rusqlite::Error> {
        let date_str: String = row.get(1)?;
        let mentions: i64 = row.get(2)?;
        let authors: i64 = row.get(3)?;
        let first_str: String = row.get(7)?;
        let last_str: String = row.get(8)?;
        Ok(DailyRollup {
            symbol: row.get(0)?,
            calendar_date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|_| rusqlite::Error::InvalidColumnType(1, "calendar_date".into(), rusqlite::types::Type::Text))?,
            mention_count: mentions.max(0) as u64,
            unique_authors: authors.max(0) as u64,
            avg_confidence: row.get(4)?,
            min_confidence: row.get(5)?,
            max_confidence: row.get(6)?,
            first_seen: parse_ts(&first_str, 7)?,
            last_seen: parse_ts(&last_str, 8)?,
        })
    }
}

impl RollupRepository for SqliteRollupRepo {
    fn replace_day(&self, date: NaiveDate, rollups: &[DailyRollup]) -> Result<(), DomainError> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut conn = lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| db_err("Failed to begin rollup write", e))?;
        tx.execute("DELETE FROM daily_rollups WHERE calendar_date = ?1", params![day])
            .map_err(|e| db_err("Failed to clear rollups", e))?;
        for r in rollups {
            tx.execute(
                "INSERT INTO daily_rollups (symbol, calendar_date, mention_count, unique_authors, avg_confidence, min_confidence, max_confidence, first_seen, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    r.symbol,
                    day,
                    r.mention_count as i64,
                    r.unique_authors as i64,
                    r.avg_confidence,
                    r.min_confidence,
                    r.max_confidence,
                    ts(&r.first_seen),
                    ts(&r.last_seen),
                ],
            )
            .map_err(|e| db_err("Failed to write rollup", e))?;
        }
        tx.commit().map_err(|e| db_err("Failed to commit rollups", e))?;
        Ok(())
    }

    fn for_day(&self, date: NaiveDate, limit: Option<usize>) -> Result<Vec<DailyRollup>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, calendar_date, mention_count, unique_authors, avg_confidence, min_confidence, max_confidence, first_seen, last_seen
                 FROM daily_rollups WHERE calendar_date = ?1
                 ORDER BY mention_count DESC, symbol ASC
                 LIMIT ?2",
            )
            .map_err(|e| db_err("Failed to load rollups", e))?;
        let rollups = stmt
            .query_map(
                params![date.format("%Y-%m-%d").to_string(), limit.map_or(-1, |l| l as i64)],
                Self::row_to_rollup,
            )
            .map_err(|e| db_err("Failed to load rollups", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rollups)
    }
}
