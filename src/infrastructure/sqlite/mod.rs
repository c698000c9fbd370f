pub mod arbitration_log_repo;
pub mod blacklist_repo;
pub mod cursor_repo;
pub mod detection_repo;
pub mod message_repo;
pub mod migrations;
pub mod reference_repo;
pub mod rollup_repo;

use crate::domain::error::DomainError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One connection shared by every repository, so `:memory:` is a single
/// database and writers serialize on the lock.
pub type SharedConnection = Arc<Mutex<Connection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn open_database(path: &str) -> Result<SharedConnection, DomainError> {
    let conn = Connection::open(path).map_err(|e| db_err("DB error", e))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| db_err("WAL error", e))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| db_err("foreign_keys error", e))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| db_err("busy_timeout error", e))?;
    migrations::run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Busy, locked, unopenable or failing storage halts a pass; anything else is
/// a per-message database error.
pub(crate) fn db_err(context: &str, e: rusqlite::Error) -> DomainError {
    let unavailable = matches!(
        &e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DiskFull
            )
    );
    if unavailable {
        DomainError::PersistenceUnavailable(format!("{context}: {e}"))
    } else {
        DomainError::Database(format!("{context}: {e}"))
    }
}

pub(crate) fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>, DomainError> {
    conn.lock()
        .map_err(|e| DomainError::PersistenceUnavailable(e.to_string()))
}

/// Fixed-width so stored timestamps compare correctly as text.
pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp read from column `idx` of a row.
pub(crate) fn parse_ts(s: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}
