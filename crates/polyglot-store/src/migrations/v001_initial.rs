//! v001 -- Initial schema creation.
//!
//! Creates the six relay tables: `message_map`, `glossary`, `guild_settings`,
//! `users`, `channel_overrides`, and `usage`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Message mappings (original -> translated copy)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS message_map (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id          INTEGER NOT NULL,      -- platform snowflake
    channel_id        INTEGER NOT NULL,      -- channel of the translated copy
    original_msg_id   INTEGER NOT NULL,
    translated_msg_id INTEGER NOT NULL,
    dst_lang          TEXT NOT NULL,         -- destination language code
    target_kind       TEXT NOT NULL,         -- inline | threaded | dm
    created_at        TEXT NOT NULL          -- ISO-8601 / RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_message_map_original
    ON message_map(original_msg_id);

-- ----------------------------------------------------------------
-- Glossary (per-guild pinned term translations)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS glossary (
    guild_id    INTEGER NOT NULL,
    term        TEXT NOT NULL,
    translation TEXT NOT NULL,
    context     TEXT,
    priority    INTEGER NOT NULL DEFAULT 100,

    PRIMARY KEY (guild_id, term)
);

-- ----------------------------------------------------------------
-- Guild settings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS guild_settings (
    guild_id             INTEGER PRIMARY KEY NOT NULL,
    default_lang         TEXT,
    default_mode         TEXT NOT NULL DEFAULT 'on_demand',
    inline_auto_max_langs INTEGER NOT NULL DEFAULT 1,
    retention_hours      INTEGER NOT NULL DEFAULT 72,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- User preferences
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    user_id           INTEGER PRIMARY KEY NOT NULL,
    preferred_lang    TEXT,
    dm_mirror_enabled INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Channel overrides
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channel_overrides (
    channel_id   INTEGER PRIMARY KEY NOT NULL,
    guild_id     INTEGER NOT NULL,
    enabled      INTEGER NOT NULL DEFAULT 1,
    mode         TEXT,
    target_langs TEXT,                       -- comma-separated codes
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_channel_overrides_guild
    ON channel_overrides(guild_id);

-- ----------------------------------------------------------------
-- Usage accounting (per guild, per day)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS usage (
    guild_id          INTEGER NOT NULL,
    day               TEXT NOT NULL,         -- YYYY-MM-DD
    char_count        INTEGER NOT NULL DEFAULT 0,
    cost_estimate_usd REAL NOT NULL DEFAULT 0.0,

    PRIMARY KEY (guild_id, day)
);
"#;

/// Apply the v001 schema.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
