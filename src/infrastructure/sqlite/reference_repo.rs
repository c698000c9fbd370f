use super::{db_err, lock, SharedConnection};
use crate::domain::entities::reference_entry::ReferenceEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::reference_registry::ReferenceRegistry;
use crate::domain::values::symbol::normalize_symbol;
use rusqlite::{params, OptionalExtension};

const SELECT_COLS: &str = "symbol, venue, security_class, is_active, name";

pub struct SqliteReferenceRegistry {
    conn: SharedConnection,
}

impl SqliteReferenceRegistry {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn upsert(&self, entry: &ReferenceEntry) -> Result<ReferenceEntry, DomainError> {
        let symbol = normalize_symbol(&entry.symbol)
            .ok_or_else(|| DomainError::InvalidInput(format!("Invalid symbol: {}", entry.symbol)))?;
        if entry.venue.trim().is_empty() || entry.security_class.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "venue and security_class are required".into(),
            ));
        }
        let entry = ReferenceEntry {
            symbol,
            ..entry.clone()
        };
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO reference_symbols (symbol, venue, security_class, is_active, name)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(symbol) DO UPDATE SET
                venue = excluded.venue,
                security_class = excluded.security_class,
                is_active = excluded.is_active,
                name = excluded.name",
            params![
                entry.symbol,
                entry.venue,
                entry.security_class,
                entry.is_active as i32,
                entry.name,
            ],
        )
        .map_err(|e| db_err("Failed to save reference entry", e))?;
        Ok(entry)
    }

    fn row_to_entry(row: &rusqlite::Row) -> Result<ReferenceEntry, rusqlite::Error> {
        let active: i32 = row.get(3)?;
        Ok(ReferenceEntry {
            symbol: row.get(0)?,
            venue: row.get(1)?,
            security_class: row.get(2)?,
            is_active: active != 0,
            name: row.get(4)?,
        })
    }
}

impl ReferenceRegistry for SqliteReferenceRegistry {
    fn lookup(&self, symbol: &str) -> Result<Option<ReferenceEntry>, DomainError> {
        let conn = lock(&self.conn)?;
        conn.query_row(
            &format!("SELECT {SELECT_COLS} FROM reference_symbols WHERE symbol = ?1"),
            params![symbol.to_uppercase()],
            Self::row_to_entry,
        )
        .optional()
        .map_err(|e| DomainError::RegistryUnavailable(e.to_string()))
    }

    fn all_entries(&self) -> Result<Vec<ReferenceEntry>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SELECT_COLS} FROM reference_symbols ORDER BY symbol"))
            .map_err(|e| DomainError::RegistryUnavailable(e.to_string()))?;
        let entries = stmt
            .query_map([], Self::row_to_entry)
            .map_err(|e| DomainError::RegistryUnavailable(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }
}
