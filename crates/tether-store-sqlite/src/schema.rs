//! SQL schema for the Tether SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS contacts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    phone_number    TEXT,
    email           TEXT,
    linked_id       INTEGER REFERENCES contacts(id),
    link_precedence TEXT NOT NULL,    -- 'primary' | 'secondary'
    created_at      TEXT NOT NULL,    -- RFC 3339 UTC, fixed microsecond width
    updated_at      TEXT NOT NULL,
    deleted_at      TEXT,             -- soft-delete marker; NULL = live
    CHECK (email IS NOT NULL OR phone_number IS NOT NULL),
    CHECK (link_precedence IN ('primary', 'secondary')),
    CHECK ((link_precedence = 'primary') = (linked_id IS NULL))
);

CREATE INDEX IF NOT EXISTS contacts_email_idx  ON contacts(email);
CREATE INDEX IF NOT EXISTS contacts_phone_idx  ON contacts(phone_number);
CREATE INDEX IF NOT EXISTS contacts_linked_idx ON contacts(linked_id);

PRAGMA user_version = 1;
";
