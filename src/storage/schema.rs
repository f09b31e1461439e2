//! Database schema for the stars store.
//!
//! Owners, licenses and topics are shared value tables; repositories
//! reference them by natural key. Timestamps are RFC 3339 strings with
//! millisecond precision, which sort chronologically as text.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the stars database.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS licenses (
    spdx_id TEXT PRIMARY KEY NOT NULL,
    name TEXT,
    nickname TEXT,
    url TEXT
);

CREATE TABLE IF NOT EXISTS owners (
    login TEXT PRIMARY KEY NOT NULL,
    url TEXT NOT NULL,
    is_organization INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS topics (
    name TEXT PRIMARY KEY NOT NULL,
    stargazer_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    url TEXT NOT NULL,
    homepage_url TEXT,
    owner TEXT NOT NULL,
    is_archived INTEGER NOT NULL DEFAULT 0,
    is_fork INTEGER NOT NULL DEFAULT 0,
    is_private INTEGER NOT NULL DEFAULT 0,
    is_template INTEGER NOT NULL DEFAULT 0,
    latest_release TEXT,
    license TEXT,
    stargazer_count INTEGER NOT NULL DEFAULT 0,
    fork_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    pushed_at TEXT,
    starred_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    imported_at TEXT NOT NULL,
    unstarred_at TEXT,
    languages TEXT,
    funding_links TEXT,
    FOREIGN KEY (owner) REFERENCES owners(login) ON DELETE CASCADE ON UPDATE CASCADE,
    FOREIGN KEY (license) REFERENCES licenses(spdx_id) ON DELETE SET NULL ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_repositories_name ON repositories(name);
CREATE INDEX IF NOT EXISTS idx_repositories_owner ON repositories(owner);
CREATE INDEX IF NOT EXISTS idx_repositories_license ON repositories(license);
CREATE INDEX IF NOT EXISTS idx_repositories_starred_at ON repositories(starred_at DESC);
CREATE INDEX IF NOT EXISTS idx_repositories_imported_at ON repositories(imported_at);

CREATE TABLE IF NOT EXISTS repositories_topics (
    repo_id TEXT NOT NULL,
    topic_name TEXT NOT NULL,
    FOREIGN KEY (repo_id) REFERENCES repositories(id) ON DELETE CASCADE ON UPDATE CASCADE,
    FOREIGN KEY (topic_name) REFERENCES topics(name) ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS uidx_repositories_topics
    ON repositories_topics(repo_id, topic_name);
";

/// Apply the schema to the database.
///
/// Connection pragmas are set first (they are no-ops inside a
/// transaction), then the DDL and the version row are written in one
/// transaction. Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if a pragma or the DDL fails; nothing is applied then.
pub fn apply_schema(conn: &mut Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        ],
    )?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_apply_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).expect("Failed to apply schema");

        let tables = table_names(&conn);
        for table in ["licenses", "owners", "topics", "repositories", "repositories_topics"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).expect("First apply failed");
        apply_schema(&mut conn).expect("Second apply failed");

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn test_repository_requires_owner() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).unwrap();

        let result = conn.execute(
            "INSERT INTO repositories (id, name, url, owner, created_at, starred_at, updated_at, imported_at)
             VALUES ('R_1', 'x', 'https://github.com/nobody/x', 'nobody', 't', 't', 't', 't')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_topic_links_are_unique() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).unwrap();

        conn.execute_batch(
            "INSERT INTO owners (login, url) VALUES ('alice', 'https://github.com/alice');
             INSERT INTO topics (name, stargazer_count) VALUES ('rust', 10);
             INSERT INTO repositories (id, name, url, owner, created_at, starred_at, updated_at, imported_at)
             VALUES ('R_1', 'x', 'https://github.com/alice/x', 'alice', 't', 't', 't', 't');
             INSERT INTO repositories_topics (repo_id, topic_name) VALUES ('R_1', 'rust');",
        )
        .unwrap();

        let duplicate = conn.execute(
            "INSERT INTO repositories_topics (repo_id, topic_name) VALUES ('R_1', 'rust')",
            [],
        );
        assert!(duplicate.is_err());
    }
}
