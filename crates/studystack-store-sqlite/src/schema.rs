//! SQL schema for the StudyStack SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    is_superuser  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    slug       TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
    resource_id TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    author_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    image       TEXT,
    link        TEXT,
    status      TEXT NOT NULL DEFAULT 'draft',  -- 'draft' | 'published' | 'withdrawn'
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at  TEXT NOT NULL
);

-- One row per (resource, subject) pair; the pair constraint makes
-- attachment idempotent under INSERT OR IGNORE.
CREATE TABLE IF NOT EXISTS resource_subjects (
    resource_id TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    UNIQUE (resource_id, subject_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  TEXT PRIMARY KEY,
    resource_id TEXT NOT NULL REFERENCES resources(resource_id) ON DELETE CASCADE,
    author_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    body        TEXT NOT NULL,
    approved    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS resources_status_idx  ON resources(status);
CREATE INDEX IF NOT EXISTS resources_created_idx ON resources(created_at);
CREATE INDEX IF NOT EXISTS resource_subjects_subject_idx
    ON resource_subjects(subject_id);
CREATE INDEX IF NOT EXISTS comments_resource_idx ON comments(resource_id);

PRAGMA user_version = 1;
";
