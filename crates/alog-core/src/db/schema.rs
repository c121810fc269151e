//! Canonical SQLite schema for an alog store.
//!
//! - `users`, `characters`, `dungeon_masters` hold the owned records
//! - `logs` is the journal; a log belongs to a user and, unless it is an
//!   unapplied DM log, to a character
//! - `ledger_items` holds magic items and story awards, each tied to the log
//!   that gained it and optionally the log that lost it
//! - `store_meta` records the schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
    created_at_us INTEGER NOT NULL,
    CHECK (user_id LIKE 'u-%')
);

CREATE TABLE IF NOT EXISTS characters (
    character_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    race TEXT,
    class TEXT,
    campaign TEXT,
    sheet_url TEXT,
    image_url TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (character_id LIKE 'ch-%')
);

CREATE TABLE IF NOT EXISTS dungeon_masters (
    dm_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    dci TEXT,
    is_user INTEGER NOT NULL DEFAULT 0 CHECK (is_user IN (0, 1)),
    created_at_us INTEGER NOT NULL,
    CHECK (dm_id LIKE 'dm-%')
);

CREATE TABLE IF NOT EXISTS logs (
    log_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    character_id TEXT REFERENCES characters(character_id) ON DELETE CASCADE,
    dm_id TEXT REFERENCES dungeon_masters(dm_id) ON DELETE SET NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    log_type TEXT NOT NULL DEFAULT 'game' CHECK (log_type IN ('game', 'nongame')),
    date_us INTEGER NOT NULL,
    applied_date_us INTEGER,
    is_dm_log INTEGER NOT NULL DEFAULT 0 CHECK (is_dm_log IN (0, 1)),
    experience INTEGER NOT NULL DEFAULT 0,
    acp INTEGER NOT NULL DEFAULT 0,
    tcp INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 0,
    gold REAL NOT NULL DEFAULT 0,
    dtd INTEGER NOT NULL DEFAULT 0,
    description TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (log_id LIKE 'lg-%'),
    CHECK (is_dm_log = 1 OR character_id IS NOT NULL),
    CHECK (applied_date_us IS NULL OR is_dm_log = 1)
);

CREATE TABLE IF NOT EXISTS ledger_items (
    item_id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('magic_item', 'story_award')),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT,
    log_gained_id TEXT NOT NULL REFERENCES logs(log_id) ON DELETE CASCADE,
    log_lost_id TEXT REFERENCES logs(log_id) ON DELETE SET NULL,
    position INTEGER NOT NULL DEFAULT 0,
    created_at_us INTEGER NOT NULL,
    CHECK (item_id LIKE 'it-%')
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us)
VALUES (1, 1, CAST(strftime('%s', 'now') AS INTEGER) * 1000000);
"#;

/// Migration v2: read-path indexes and the one-self-DM-per-user rule.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_characters_user_name
    ON characters(user_id, name COLLATE NOCASE);

CREATE INDEX IF NOT EXISTS idx_dungeon_masters_user_name
    ON dungeon_masters(user_id, name COLLATE NOCASE);

CREATE UNIQUE INDEX IF NOT EXISTS idx_dungeon_masters_self
    ON dungeon_masters(user_id) WHERE is_user = 1;

CREATE INDEX IF NOT EXISTS idx_logs_character_date
    ON logs(character_id, date_us);

CREATE INDEX IF NOT EXISTS idx_logs_user_dm_date
    ON logs(user_id, is_dm_log, date_us DESC);

CREATE INDEX IF NOT EXISTS idx_logs_dm
    ON logs(dm_id);

CREATE INDEX IF NOT EXISTS idx_ledger_items_gained
    ON ledger_items(log_gained_id, position);

CREATE INDEX IF NOT EXISTS idx_ledger_items_lost
    ON ledger_items(log_lost_id);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
"#;

/// Indexes expected by per-owner and per-character read paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_characters_user_name",
    "idx_dungeon_masters_user_name",
    "idx_dungeon_masters_self",
    "idx_logs_character_date",
    "idx_logs_user_dm_date",
    "idx_logs_dm",
    "idx_ledger_items_gained",
    "idx_ledger_items_lost",
];
