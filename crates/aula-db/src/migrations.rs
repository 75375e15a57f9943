//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;

use aula_core::{Error, Result};

/// V1: initial schema -- users, auth tokens, catalog, enrollments, progress.
const V1_INITIAL: &str = r#"
-- Users and auth
CREATE TABLE users (
    id            TEXT PRIMARY KEY,
    username      TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'student',
    created_at    TEXT NOT NULL
);

CREATE TABLE auth_tokens (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token      TEXT UNIQUE NOT NULL,
    expires_at TEXT NOT NULL
);

-- Course catalog
CREATE TABLE courses (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    level       TEXT NOT NULL DEFAULT 'beginner',
    created_at  TEXT NOT NULL
);

CREATE TABLE lectures (
    id            TEXT PRIMARY KEY,
    course_id     TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    media_path    TEXT NOT NULL DEFAULT '',
    duration_secs INTEGER NOT NULL DEFAULT 0,
    order_index   INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Enrollment state (absence of a row = not enrolled)
CREATE TABLE enrollments (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    course_id    TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    status       TEXT NOT NULL DEFAULT 'pending',
    requested_at TEXT NOT NULL,
    decided_at   TEXT,
    UNIQUE (user_id, course_id)
);

-- Watched-position checkpoints and completion facts.
-- watched_seconds only ever grows (max-merge on write); completed_at is
-- written once and never overwritten.
CREATE TABLE lecture_progress (
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    lecture_id      TEXT NOT NULL REFERENCES lectures(id) ON DELETE CASCADE,
    watched_seconds INTEGER NOT NULL DEFAULT 0,
    completed       INTEGER NOT NULL DEFAULT 0,
    completed_at    TEXT,
    updated_at      TEXT NOT NULL,
    PRIMARY KEY (user_id, lecture_id)
);

-- Indexes
CREATE INDEX idx_lectures_course      ON lectures(course_id);
CREATE INDEX idx_enrollments_user     ON enrollments(user_id);
CREATE INDEX idx_enrollments_course   ON enrollments(course_id);
CREATE INDEX idx_progress_user        ON lecture_progress(user_id);
CREATE INDEX idx_auth_tokens_user     ON auth_tokens(user_id);
"#;

/// V2: seed the anonymous user used when auth is disabled.
///
/// The auth middleware returns this well-known UUID for unauthenticated
/// requests. Without a corresponding row in `users`, any INSERT into
/// `lecture_progress` or `enrollments` violates the FK constraint.
const V2_ANONYMOUS_USER: &str = r#"
INSERT OR IGNORE INTO users (id, username, password_hash, display_name, role, created_at)
VALUES ('00000000-0000-0000-0000-000000000000', 'anonymous', '!disabled', 'Anonymous', 'admin', '1970-01-01T00:00:00Z');
"#;

/// All migrations in order.
const MIGRATIONS: &[(usize, &str, &str)] = &[
    (1, "initial", V1_INITIAL),
    (2, "anonymous_user", V2_ANONYMOUS_USER),
];

/// Run all pending migrations.
///
/// Creates the `schema_migrations` table if needed, determines which
/// migrations still need to be applied, and applies each in order inside a
/// transaction. Returns the number of migrations applied.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY NOT NULL,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let current = current_version(conn)?;

    let mut applied = 0;
    for (version, name, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("migration {version} ({name}) failed: {e}")))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![version, name],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit()
            .map_err(|e| Error::database(format!("migration {version} commit failed: {e}")))?;

        tracing::debug!("Applied migration {version}: {name}");
        applied += 1;
    }

    Ok(applied)
}

/// Get the current schema version without applying migrations.
pub fn current_version(conn: &Connection) -> Result<usize> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<usize>>(0)
        })
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(version.unwrap_or(0))
}

/// Get the latest available migration version.
pub fn latest_version() -> usize {
    MIGRATIONS.last().map(|(v, _, _)| *v).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn run_migrations_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        let applied = run_migrations(&conn).unwrap();
        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(current_version(&conn).unwrap(), latest_version());

        let applied = run_migrations(&conn).unwrap();
        assert_eq!(applied, 0);
    }

    #[test]
    fn schema_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "users",
            "auth_tokens",
            "courses",
            "lectures",
            "enrollments",
            "lecture_progress",
            "schema_migrations",
        ];

        for table in tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {table} should exist");
        }
    }

    #[test]
    fn anonymous_user_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let username: String = conn
            .query_row(
                "SELECT username FROM users WHERE id = '00000000-0000-0000-0000-000000000000'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(username, "anonymous");
    }

    #[test]
    fn duplicate_enrollment_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (id, username, password_hash, display_name, role, created_at)
             VALUES ('u1', 'a', 'h', 'A', 'student', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO courses (id, title, created_at) VALUES ('c1', 'T', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO enrollments (id, user_id, course_id, status, requested_at)
             VALUES ('e1', 'u1', 'c1', 'pending', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO enrollments (id, user_id, course_id, status, requested_at)
             VALUES ('e2', 'u1', 'c1', 'pending', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(dup.is_err());
    }
}
