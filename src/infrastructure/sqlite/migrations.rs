use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            channel_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            author_display_name TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL,
            observed_at TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS edit_checkpoints (
            source_id TEXT NOT NULL,
            message_id TEXT NOT NULL,
            revision INTEGER NOT NULL,
            PRIMARY KEY (source_id, message_id)
        );

        CREATE TABLE IF NOT EXISTS detections (
            id TEXT PRIMARY KEY,
            message_id TEXT NOT NULL,
            channel_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            extraction_method TEXT NOT NULL,
            final_confidence REAL NOT NULL,
            context_strength REAL NOT NULL,
            position INTEGER NOT NULL,
            detected_text TEXT NOT NULL,
            exchange TEXT,
            rule_outcome TEXT NOT NULL DEFAULT 'accepted',
            observed_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (message_id, symbol, position)
        );

        CREATE TABLE IF NOT EXISTS processing_cursors (
            source_id TEXT PRIMARY KEY,
            last_observed_at TEXT NOT NULL,
            last_message_id TEXT NOT NULL,
            messages_processed_count INTEGER NOT NULL DEFAULT 0,
            detections_count INTEGER NOT NULL DEFAULT 0,
            error_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS blacklist_rules (
            symbol TEXT PRIMARY KEY,
            min_confidence REAL NOT NULL DEFAULT 0,
            requires_cashtag INTEGER NOT NULL DEFAULT 0,
            requires_price_context INTEGER NOT NULL DEFAULT 0,
            is_permanent INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS blacklist_phrases (
            symbol TEXT NOT NULL REFERENCES blacklist_rules(symbol) ON DELETE CASCADE,
            ordinal INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('required', 'excluded')),
            phrase TEXT NOT NULL,
            PRIMARY KEY (symbol, ordinal)
        );

        CREATE TABLE IF NOT EXISTS reference_symbols (
            symbol TEXT PRIMARY KEY,
            venue TEXT NOT NULL,
            security_class TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS arbitration_log (
            id TEXT PRIMARY KEY,
            symbol TEXT NOT NULL,
            message_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            is_genuine_stock INTEGER NOT NULL,
            confidence REAL NOT NULL,
            reasoning TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_rollups (
            symbol TEXT NOT NULL,
            calendar_date TEXT NOT NULL,
            mention_count INTEGER NOT NULL,
            unique_authors INTEGER NOT NULL,
            avg_confidence REAL NOT NULL,
            min_confidence REAL NOT NULL,
            max_confidence REAL NOT NULL,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            PRIMARY KEY (symbol, calendar_date)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_observed ON messages(observed_at, id);
        CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel_id, observed_at);
        CREATE INDEX IF NOT EXISTS idx_detections_symbol ON detections(symbol, observed_at);
        CREATE INDEX IF NOT EXISTS idx_detections_observed ON detections(observed_at);
        CREATE INDEX IF NOT EXISTS idx_arbitration_symbol ON arbitration_log(symbol, created_at);
        "
    ).map_err(|e| format!("Migration failed: {e}"))
}
