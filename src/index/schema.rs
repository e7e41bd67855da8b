//! SQLite schema and migrations for the zettel index.
//!
//! The schema version lives in `PRAGMA user_version`. Each entry of
//! [`MIGRATIONS`] moves the database one version forward and runs inside its
//! own transaction.

use crate::index::{IndexError, IndexResult};
use log::{debug, info};
use rusqlite::Connection;

// ===========================================
// Version 1: notes, links, history, full-text
// ===========================================

const V1_TABLES: &str = "
CREATE TABLE IF NOT EXISTS zettel (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    path TEXT NOT NULL UNIQUE,
    type TEXT NOT NULL CHECK (type IN ('fleet', 'permanent')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_zettel_slug ON zettel(slug);
CREATE INDEX IF NOT EXISTS idx_zettel_type_updated ON zettel(type, updated_at);

CREATE TABLE IF NOT EXISTS link (
    zettel_id TEXT NOT NULL REFERENCES zettel(id) ON DELETE CASCADE,
    link_id TEXT NOT NULL REFERENCES zettel(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (zettel_id, link_id)
);

CREATE INDEX IF NOT EXISTS idx_link_target ON link(link_id);

CREATE TABLE IF NOT EXISTS history (
    zettel_id TEXT PRIMARY KEY REFERENCES zettel(id) ON DELETE CASCADE,
    touched INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
";

// External-content FTS5 table kept in sync with `zettel` by triggers.
const V1_SEARCH: &str = "
CREATE VIRTUAL TABLE IF NOT EXISTS zettel_fts USING fts5(
    title,
    content,
    content='zettel',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS zettel_fts_insert
AFTER INSERT ON zettel BEGIN
    INSERT INTO zettel_fts(rowid, title, content)
    VALUES (new.rowid, new.title, new.content);
END;

CREATE TRIGGER IF NOT EXISTS zettel_fts_delete
AFTER DELETE ON zettel BEGIN
    INSERT INTO zettel_fts(zettel_fts, rowid, title, content)
    VALUES ('delete', old.rowid, old.title, old.content);
END;

CREATE TRIGGER IF NOT EXISTS zettel_fts_update
AFTER UPDATE ON zettel BEGIN
    INSERT INTO zettel_fts(zettel_fts, rowid, title, content)
    VALUES ('delete', old.rowid, old.title, old.content);
    INSERT INTO zettel_fts(rowid, title, content)
    VALUES (new.rowid, new.title, new.content);
END;
";

/// Ordered migrations. Index `n` upgrades version `n` to `n + 1`.
const MIGRATIONS: &[&[&str]] = &[&[V1_TABLES, V1_SEARCH]];

/// The schema version this build writes.
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Creates or upgrades the schema. Safe to call on every open.
pub fn create_schema(conn: &mut Connection) -> IndexResult<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(IndexError::UnsupportedSchemaVersion {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    for (index, steps) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let target = index as u32 + 1;
        let tx = conn.transaction()?;
        for sql in steps.iter() {
            tx.execute_batch(sql)?;
        }
        tx.pragma_update(None, "user_version", target)?;
        tx.commit()?;
        info!("event=schema_migrated version={}", target);
    }

    debug!("event=schema_ready version={}", SCHEMA_VERSION);
    Ok(())
}

/// Returns the version recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> IndexResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'trigger') ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_tables_and_triggers() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&mut conn).unwrap();

        let names = table_names(&conn);
        for expected in [
            "history",
            "link",
            "zettel",
            "zettel_fts",
            "zettel_fts_delete",
            "zettel_fts_insert",
            "zettel_fts_update",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn records_schema_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
        create_schema(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn create_schema_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&mut conn).unwrap();
        create_schema(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn rejects_newer_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = create_schema(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            IndexError::UnsupportedSchemaVersion { found, .. } if found == SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn type_is_constrained() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&mut conn).unwrap();

        let result = conn.execute(
            "INSERT INTO zettel (id, slug, title, content, path, type, created_at, updated_at)
             VALUES ('1', 'a', 'A', '', '/a.1.md', 'draft', '', '')",
            [],
        );
        assert!(result.is_err());
    }
}
