//! SQL migration definitions for the Lectern database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: users, courses, lectures, uploads",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Registered users
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    full_name     TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- Courses
CREATE TABLE IF NOT EXISTS courses (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    owner_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_courses_owner ON courses(owner_id);

-- Lectures with their attached materials
CREATE TABLE IF NOT EXISTS lectures (
    id             TEXT PRIMARY KEY,
    course_id      TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    note           TEXT,
    slides         TEXT,
    recording      TEXT,
    transcript     TEXT,
    transcript_vtt TEXT,
    ai_note        TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lectures_course ON lectures(course_id);

-- Uploaded file metadata (the bytes live on disk under the uploads dir)
CREATE TABLE IF NOT EXISTS uploads (
    id           TEXT PRIMARY KEY,
    course_id    TEXT NOT NULL,
    lecture_id   TEXT NOT NULL,
    file_name    TEXT NOT NULL,
    path         TEXT NOT NULL,
    kind         TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    uploaded_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_uploads_course ON uploads(course_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
