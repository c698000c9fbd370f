use super::{db_err, lock, ts, SharedConnection};
use crate::domain::entities::blacklist_rule::{BlacklistRule, PhraseKind, PhraseRule};
use crate::domain::error::DomainError;
use crate::domain::ports::blacklist_store::BlacklistStore;
use crate::domain::values::symbol::normalize_symbol;
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, warn};

const PERMANENT_WORDS: &[&str] = &[
    "CAN", "ALL", "ARE", "FOR", "THE", "AND", "YOU", "NOW", "ONE", "OUT", "SEE", "GO", "IT", "SO",
    "ON", "BE", "AT", "DO",
];

const CASHTAG_ONLY_JARGON: &[&str] = &[
    "DD", "EOD", "ATH", "HOD", "LOD", "PT", "CEO", "IPO", "FOMO", "YOLO", "IMO",
];

const PRICE_CONTEXT_WORDS: &[&str] = &["NEW", "REAL", "OPEN", "LOVE", "NEXT"];

/// Rules installed by `seed_default_rules`.
pub fn default_rules() -> Vec<BlacklistRule> {
    let mut rules: Vec<BlacklistRule> = PERMANENT_WORDS
        .iter()
        .map(|s| BlacklistRule::permanent(*s))
        .collect();
    rules.push(
        BlacklistRule::conditional("ADD", 0.0)
            .with_phrase(PhraseRule::required("shares"))
            .with_phrase(PhraseRule::required("$"))
            .with_phrase(PhraseRule::excluded("I'll add"))
            .with_phrase(PhraseRule::excluded("will add")),
    );
    rules.extend(
        CASHTAG_ONLY_JARGON
            .iter()
            .map(|s| BlacklistRule::conditional(*s, 0.0).requiring_cashtag()),
    );
    rules.extend(
        PRICE_CONTEXT_WORDS
            .iter()
            .map(|s| BlacklistRule::conditional(*s, 0.9).requiring_price_context()),
    );
    rules
}

pub struct SqliteBlacklistStore {
    conn: SharedConnection,
}

impl SqliteBlacklistStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Operator upsert. Replaces the rule's phrase list wholesale.
    pub fn upsert_rule(&self, rule: &BlacklistRule) -> Result<BlacklistRule, DomainError> {
        let rule = Self::validated(rule)?;
        let mut conn = lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| db_err("Failed to begin rule update", e))?;
        Self::write_rule(&tx, &rule)?;
        tx.commit().map_err(|e| db_err("Failed to commit rule", e))?;
        info!(symbol = %rule.symbol, permanent = rule.is_permanent, "blacklist rule saved");
        Ok(rule)
    }

    pub fn delete_rule(&self, symbol: &str) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn
            .execute(
                "DELETE FROM blacklist_rules WHERE symbol = ?1",
                params![symbol.to_uppercase()],
            )
            .map_err(|e| db_err("Failed to delete rule", e))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Rule not found: {symbol}")));
        }
        Ok(())
    }

    /// Insert the deployment defaults for symbols that have no rule yet.
    /// Returns how many were added.
    pub fn seed_default_rules(&self) -> Result<usize, DomainError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| db_err("Failed to begin seeding", e))?;
        let mut added = 0;
        for rule in default_rules() {
            let exists: bool = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM blacklist_rules WHERE symbol = ?1)",
                    params![rule.symbol],
                    |row| row.get(0),
                )
                .map_err(|e| db_err("Failed to check rule", e))?;
            if !exists {
                Self::write_rule(&tx, &rule)?;
                added += 1;
            }
        }
        tx.commit().map_err(|e| db_err("Failed to commit seed rules", e))?;
        info!(added, "default blacklist rules seeded");
        Ok(added)
    }

    fn validated(rule: &BlacklistRule) -> Result<BlacklistRule, DomainError> {
        let symbol = normalize_symbol(&rule.symbol)
            .ok_or_else(|| DomainError::InvalidInput(format!("Invalid symbol: {}", rule.symbol)))?;
        if !(0.0..=1.0).contains(&rule.min_confidence) {
            return Err(DomainError::InvalidInput(format!(
                "min_confidence must be within [0, 1], got {}",
                rule.min_confidence
            )));
        }
        if rule.phrases.iter().any(|p| p.phrase.trim().is_empty()) {
            return Err(DomainError::InvalidInput("Empty phrase in rule".into()));
        }
        Ok(BlacklistRule {
            symbol,
            ..rule.clone()
        })
    }

    fn write_rule(conn: &Connection, rule: &BlacklistRule) -> Result<(), DomainError> {
        conn.execute(
            "INSERT INTO blacklist_rules (symbol, min_confidence, requires_cashtag, requires_price_context, is_permanent, notes, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(symbol) DO UPDATE SET
                min_confidence = excluded.min_confidence,
                requires_cashtag = excluded.requires_cashtag,
                requires_price_context = excluded.requires_price_context,
                is_permanent = excluded.is_permanent,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                rule.symbol,
                rule.min_confidence,
                rule.requires_cashtag as i32,
                rule.requires_price_context as i32,
                rule.is_permanent as i32,
                rule.notes,
                ts(&Utc::now()),
            ],
        )
        .map_err(|e| db_err("Failed to save rule", e))?;
        conn.execute(
            "DELETE FROM blacklist_phrases WHERE symbol = ?1",
            params![rule.symbol],
        )
        .map_err(|e| db_err("Failed to clear rule phrases", e))?;
        for (ordinal, phrase) in rule.phrases.iter().enumerate() {
            conn.execute(
                "INSERT INTO blacklist_phrases (symbol, ordinal, kind, phrase) VALUES (?1, ?2, ?3, ?4)",
                params![rule.symbol, ordinal as i64, phrase.kind.to_string(), phrase.phrase],
            )
            .map_err(|e| db_err("Failed to save rule phrase", e))?;
        }
        Ok(())
    }

    fn load_phrases(conn: &Connection, symbol: &str) -> Result<Vec<PhraseRule>, DomainError> {
        let mut stmt = conn
            .prepare("SELECT kind, phrase FROM blacklist_phrases WHERE symbol = ?1 ORDER BY ordinal")
            .map_err(|e| db_err("Failed to load rule phrases", e))?;
        let phrases = stmt
            .query_map(params![symbol], |row| {
                let kind: String = row.get(0)?;
                let phrase: String = row.get(1)?;
                Ok((kind, phrase))
            })
            .map_err(|e| db_err("Failed to load rule phrases", e))?
            .filter_map(|r| r.ok())
            .filter_map(|(kind, phrase)| match kind.parse::<PhraseKind>() {
                Ok(kind) => Some(PhraseRule { kind, phrase }),
                Err(e) => {
                    warn!(symbol, error = %e, "skipping unknown phrase kind");
                    None
                }
            })
            .collect();
        Ok(phrases)
    }

    fn load_rules(conn: &Connection, symbol: Option<&str>) -> Result<Vec<BlacklistRule>, DomainError> {
        let mut stmt = conn
            .prepare(
                "SELECT symbol, min_confidence, requires_cashtag, requires_price_context, is_permanent, notes
                 FROM blacklist_rules WHERE ?1 IS NULL OR symbol = ?1 ORDER BY symbol",
            )
            .map_err(|e| db_err("Failed to load rules", e))?;
        let scalars: Vec<BlacklistRule> = stmt
            .query_map(params![symbol], |row| {
                let cashtag: i32 = row.get(2)?;
                let price: i32 = row.get(3)?;
                let permanent: i32 = row.get(4)?;
                Ok(BlacklistRule {
                    symbol: row.get(0)?,
                    min_confidence: row.get(1)?,
                    requires_cashtag: cashtag != 0,
                    requires_price_context: price != 0,
                    phrases: Vec::new(),
                    is_permanent: permanent != 0,
                    notes: row.get(5)?,
                })
            })
            .map_err(|e| db_err("Failed to load rules", e))?
            .filter_map(|r| r.ok())
            .collect();

        scalars
            .into_iter()
            .map(|mut rule| {
                rule.phrases = Self::load_phrases(conn, &rule.symbol)?;
                Ok(rule)
            })
            .collect()
    }
}

impl BlacklistStore for SqliteBlacklistStore {
    fn get_rule(&self, symbol: &str) -> Result<Option<BlacklistRule>, DomainError> {
        let conn = lock(&self.conn)?;
        let upper = symbol.to_uppercase();
        Ok(Self::load_rules(&conn, Some(upper.as_str()))?.into_iter().next())
    }

    fn all_rules(&self) -> Result<Vec<BlacklistRule>, DomainError> {
        let conn = lock(&self.conn)?;
        Self::load_rules(&conn, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::open_database;

    fn store() -> SqliteBlacklistStore {
        SqliteBlacklistStore::new(open_database(":memory:").unwrap())
    }

    #[test]
    fn test_seed_is_idempotent() {
        let store = store();
        let first = store.seed_default_rules().unwrap();
        assert_eq!(first, default_rules().len());
        assert_eq!(store.seed_default_rules().unwrap(), 0);
        assert!(store.get_rule("CAN").unwrap().unwrap().is_permanent);
    }

    #[test]
    fn test_seed_keeps_operator_rules() {
        let store = store();
        store
            .upsert_rule(&BlacklistRule::conditional("ADD", 0.5).requiring_cashtag())
            .unwrap();
        store.seed_default_rules().unwrap();
        let add = store.get_rule("ADD").unwrap().unwrap();
        assert!(add.requires_cashtag);
        assert!(add.phrases.is_empty());
    }

    #[test]
    fn test_phrases_round_trip_in_order() {
        let store = store();
        let rule = BlacklistRule::conditional("add", 0.7)
            .with_phrase(PhraseRule::required("shares"))
            .with_phrase(PhraseRule::excluded("I'll add"))
            .with_phrase(PhraseRule::required("$"));
        let saved = store.upsert_rule(&rule).unwrap();
        assert_eq!(saved.symbol, "ADD");

        let loaded = store.get_rule("ADD").unwrap().unwrap();
        assert_eq!(loaded.phrases, rule.phrases);
        assert_eq!(loaded.min_confidence, 0.7);
    }

    #[test]
    fn test_upsert_replaces_phrases() {
        let store = store();
        store
            .upsert_rule(&BlacklistRule::conditional("ADD", 0.7).with_phrase(PhraseRule::required("shares")))
            .unwrap();
        store.upsert_rule(&BlacklistRule::conditional("ADD", 0.8)).unwrap();
        let loaded = store.get_rule("ADD").unwrap().unwrap();
        assert!(loaded.phrases.is_empty());
        assert_eq!(loaded.min_confidence, 0.8);
    }

    #[test]
    fn test_rejects_invalid_rules() {
        let store = store();
        assert!(store.upsert_rule(&BlacklistRule::conditional("TOOLONG", 0.5)).is_err());
        assert!(store.upsert_rule(&BlacklistRule::conditional("ADD", 1.5)).is_err());
        assert!(store.delete_rule("NOPE").is_err());
    }
}
