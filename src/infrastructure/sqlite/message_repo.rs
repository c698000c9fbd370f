use super::{db_err, lock, parse_ts, ts, SharedConnection};
use crate::domain::entities::message::Message;
use crate::domain::error::DomainError;
use crate::domain::ports::message_source::{MentionHistory, MentionSample, MessageSource, ALL_CHANNELS};
use crate::domain::values::cursor_pointer::CursorPointer;
use crate::domain::values::symbol::{base_symbol, normalize_symbol};
use chrono::{DateTime, Utc};
use rusqlite::params;

const SELECT_COLS: &str = "id, channel_id, author_id, author_display_name, text, observed_at, revision";

/// Rows scanned per history lookup before token matching.
const HISTORY_SCAN_LIMIT: i64 = 1000;

/// Ingested chat messages. Doubles as the polling source and the mention
/// history used for re-admission and arbitration excerpts.
pub struct SqliteMessageRepo {
    conn: SharedConnection,
}

impl SqliteMessageRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Insert, or replace text and timestamp for an edited message. Returns
    /// the stored revision, which moves only when the text changes.
    pub fn upsert(&self, message: &Message) -> Result<u64, DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO messages (id, channel_id, author_id, author_display_name, text, observed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                revision = CASE WHEN messages.text <> excluded.text
                                THEN messages.revision + 1 ELSE messages.revision END,
                text = excluded.text,
                observed_at = excluded.observed_at,
                author_display_name = excluded.author_display_name",
            params![
                message.id,
                message.channel_id,
                message.author_id,
                message.author_display_name,
                message.text,
                ts(&message.observed_at),
            ],
        )
        .map_err(|e| db_err("Failed to store message", e))?;
        let revision: i64 = conn
            .query_row(
                "SELECT revision FROM messages WHERE id = ?1",
                params![message.id],
                |row| row.get(0),
            )
            .map_err(|e| db_err("Failed to store message", e))?;
        Ok(revision as u64)
    }

    pub fn get(&self, id: &str) -> Result<Option<Message>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SELECT_COLS} FROM messages WHERE id = ?1"))
            .map_err(|e| db_err("Failed to load message", e))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_message)
            .map_err(|e| db_err("Failed to load message", e))?;
        Ok(rows.next().and_then(|r| r.ok()))
    }

    fn row_to_message(row: &rusqlite::Row) -> Result<Message, rusqlite::Error> {
        let observed_str: String = row.get(5)?;
        Ok(Message {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            author_id: row.get(2)?,
            author_display_name: row.get(3)?,
            text: row.get(4)?,
            observed_at: parse_ts(&observed_str, 5)?,
            revision: row.get::<_, i64>(6)? as u64,
        })
    }
}

impl MessageSource for SqliteMessageRepo {
    fn fetch_after(
        &self,
        source_id: &str,
        after: &CursorPointer,
        limit: usize,
    ) -> Result<Vec<Message>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLS} FROM messages
                 WHERE (observed_at > ?1 OR (observed_at = ?1 AND id > ?2))
                   AND (?3 = ?4 OR channel_id = ?3)
                 ORDER BY observed_at ASC, id ASC
                 LIMIT ?5"
            ))
            .map_err(|e| db_err("Failed to fetch messages", e))?;
        let messages = stmt
            .query_map(
                params![
                    after.timestamp_key(),
                    after.message_id,
                    source_id,
                    ALL_CHANNELS,
                    limit as i64
                ],
                Self::row_to_message,
            )
            .map_err(|e| db_err("Failed to fetch messages", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(messages)
    }

    fn fetch_edits(
        &self,
        source_id: &str,
        since: DateTime<Utc>,
        through: &CursorPointer,
        limit: usize,
    ) -> Result<Vec<Message>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT m.id, m.channel_id, m.author_id, m.author_display_name, m.text,
                        m.observed_at, m.revision
                 FROM messages m
                 LEFT JOIN edit_checkpoints c ON c.source_id = ?1 AND c.message_id = m.id
                 WHERE m.revision > COALESCE(c.revision, 0)
                   AND m.observed_at >= ?2
                   AND (m.observed_at < ?3 OR (m.observed_at = ?3 AND m.id <= ?4))
                   AND (?1 = ?5 OR m.channel_id = ?1)
                 ORDER BY m.observed_at ASC, m.id ASC
                 LIMIT ?6"
            ))
            .map_err(|e| db_err("Failed to fetch edited messages", e))?;
        let messages = stmt
            .query_map(
                params![
                    source_id,
                    ts(&since),
                    through.timestamp_key(),
                    through.message_id,
                    ALL_CHANNELS,
                    limit as i64
                ],
                Self::row_to_message,
            )
            .map_err(|e| db_err("Failed to fetch edited messages", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(messages)
    }

    fn mark_processed(&self, source_id: &str, message: &Message) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO edit_checkpoints (source_id, message_id, revision) VALUES (?1, ?2, ?3)
             ON CONFLICT(source_id, message_id) DO UPDATE SET
                revision = MAX(edit_checkpoints.revision, excluded.revision)",
            params![source_id, message.id, message.revision as i64],
        )
        .map_err(|e| db_err("Failed to record edit checkpoint", e))?;
        Ok(())
    }
}

impl MentionHistory for SqliteMessageRepo {
    fn recent_mentions(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        exclude_message_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MentionSample>, DomainError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, text, observed_at FROM messages
                 WHERE observed_at >= ?1 AND observed_at <= ?2 AND id != ?3
                   AND instr(upper(text), ?4) > 0
                 ORDER BY observed_at DESC
                 LIMIT ?5",
            )
            .map_err(|e| db_err("Failed to load mention history", e))?;
        let samples = stmt
            .query_map(
                params![
                    ts(&since),
                    ts(&until),
                    exclude_message_id.unwrap_or(""),
                    base_symbol(symbol).to_uppercase(),
                    HISTORY_SCAN_LIMIT
                ],
                |row| {
                    let observed_str: String = row.get(2)?;
                    Ok(MentionSample {
                        message_id: row.get(0)?,
                        text: row.get(1)?,
                        observed_at: parse_ts(&observed_str, 2)?,
                    })
                },
            )
            .map_err(|e| db_err("Failed to load mention history", e))?
            .filter_map(|r| r.ok())
            .filter(|s| mentions_symbol(&s.text, symbol))
            .take(limit)
            .collect();
        Ok(samples)
    }
}

/// A cashtag in any case, or the bare symbol written in capitals. Tokens are
/// normalized first, so `$BRK-B` and `BRK.B` both mention `BRK.B`.
pub fn mentions_symbol(text: &str, symbol: &str) -> bool {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '$' || c == '.' || c == '-'))
        .map(|token| token.trim_end_matches(['.', '-']))
        .filter(|token| token.starts_with('$') || !token.chars().any(|c| c.is_ascii_lowercase()))
        .any(|token| normalize_symbol(token).as_deref() == Some(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::open_database;
    use chrono::{Duration, TimeZone};

    fn repo() -> SqliteMessageRepo {
        SqliteMessageRepo::new(open_database(":memory:").unwrap())
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 14, minute, 0).unwrap()
    }

    fn message(id: &str, text: &str, minute: u32) -> Message {
        Message::new(id, "floor", "u1", text, at(minute))
    }

    #[test]
    fn test_revision_moves_only_when_text_changes() {
        let repo = repo();
        assert_eq!(repo.upsert(&message("m1", "hello", 0)).unwrap(), 0);
        assert_eq!(repo.upsert(&message("m1", "hello", 0)).unwrap(), 0);
        assert_eq!(repo.upsert(&message("m1", "hello $XPON", 0)).unwrap(), 1);
        assert_eq!(repo.get("m1").unwrap().unwrap().revision, 1);
    }

    #[test]
    fn test_edits_behind_cursor_until_marked() {
        let repo = repo();
        repo.upsert(&message("m1", "quiet", 1)).unwrap();
        repo.upsert(&message("m2", "quiet", 2)).unwrap();
        let through = CursorPointer::new(at(2), "m2");
        let since = at(0);
        assert!(repo.fetch_edits("all", since, &through, 10).unwrap().is_empty());

        repo.upsert(&message("m1", "quiet $SLDP", 1)).unwrap();
        let edits = repo.fetch_edits("all", since, &through, 10).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].id, "m1");
        assert_eq!(edits[0].revision, 1);

        // Checkpoints are per source.
        repo.mark_processed("all", &edits[0]).unwrap();
        assert!(repo.fetch_edits("all", since, &through, 10).unwrap().is_empty());
        assert_eq!(repo.fetch_edits("floor", since, &through, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_edits_ahead_of_cursor_are_left_to_fetch_after() {
        let repo = repo();
        repo.upsert(&message("m1", "quiet", 5)).unwrap();
        repo.upsert(&message("m1", "quiet $SLDP", 5)).unwrap();
        let through = CursorPointer::new(at(4), "m0");
        assert!(repo.fetch_edits("all", at(0), &through, 10).unwrap().is_empty());
        assert!(repo
            .fetch_edits("all", at(5) + Duration::minutes(1), &CursorPointer::new(at(9), "z"), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_history_stops_at_until() {
        let repo = repo();
        repo.upsert(&message("early", "XPON long", 1)).unwrap();
        repo.upsert(&message("late", "XPON long", 9)).unwrap();
        let samples = repo.recent_mentions("XPON", at(0), at(5), None, 10).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].message_id, "early");
    }

    #[test]
    fn test_mentions_symbol() {
        assert!(mentions_symbol("XPON ripping", "XPON"));
        assert!(mentions_symbol("added $xpon.", "XPON"));
        assert!(mentions_symbol("BRK.B at highs", "BRK.B"));
        assert!(!mentions_symbol("xpon lowercase", "XPON"));
        assert!(!mentions_symbol("XPONENT", "XPON"));
    }

    #[test]
    fn test_mentions_class_shares_in_any_separator() {
        assert!(mentions_symbol("loading $BRK-B here", "BRK.B"));
        assert!(mentions_symbol("$brk.b dip", "BRK.B"));
        assert!(mentions_symbol("BRK-B at highs", "BRK.B"));
        assert!(!mentions_symbol("BRK at highs", "BRK.B"));
    }
}
