//! SQL schema for the nudge SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;

-- One row per named slot; the value is the slot's JSON array verbatim.
CREATE TABLE IF NOT EXISTS slots (
    name        TEXT PRIMARY KEY,   -- 'activeReminders' | 'completedReminders'
    value_json  TEXT NOT NULL,
    updated_at  TEXT NOT NULL       -- ISO 8601 UTC
);

-- Single-row write counter, bumped inside every write transaction so other
-- connections can tell the slots changed.
CREATE TABLE IF NOT EXISTS revision (
    id     INTEGER PRIMARY KEY CHECK (id = 0),
    value  INTEGER NOT NULL
);

INSERT OR IGNORE INTO revision (id, value) VALUES (0, 0);

PRAGMA user_version = 1;
";
