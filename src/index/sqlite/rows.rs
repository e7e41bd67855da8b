//! Row mapping between the `zettel` table and `Note`.

use crate::domain::{LinkEdge, Note, NoteId, NoteKind};
use crate::index::{IndexError, IndexResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Params, Row};
use std::path::{Path, PathBuf};

/// Columns selected for every note query, in `NoteRow` order.
pub(crate) const NOTE_COLUMNS: &str =
    "z.id, z.title, z.content, z.path, z.type, z.created_at, z.updated_at";

/// A raw `zettel` row before validation.
pub(crate) struct NoteRow {
    id: String,
    title: String,
    content: String,
    path: String,
    kind: String,
    created_at: String,
    updated_at: String,
}

impl NoteRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            path: row.get(3)?,
            kind: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    pub(crate) fn into_note(self) -> IndexResult<Note> {
        let id = parse_id(&self.id)?;
        let kind: NoteKind = self
            .kind
            .parse()
            .map_err(|e| IndexError::InvalidRow(format!("{} for note {}", e, id)))?;
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_timestamp(&self.updated_at)?;

        let mut note = Note::new(id, self.title, self.content, PathBuf::from(self.path), kind)
            .map_err(|e| IndexError::InvalidRow(e.to_string()))?;
        note.set_timestamps(created_at, updated_at);
        Ok(note)
    }
}

/// Runs a note query and converts every row.
pub(crate) fn query_notes<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> IndexResult<Vec<Note>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(params, NoteRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(NoteRow::into_note).collect()
}

/// Runs a note query expected to match at most one row.
pub(crate) fn query_note<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> IndexResult<Option<Note>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let row = stmt.query_row(params, NoteRow::from_row).optional()?;
    row.map(NoteRow::into_note).transpose()
}

pub(crate) fn query_edges(conn: &Connection) -> IndexResult<Vec<LinkEdge>> {
    let mut stmt =
        conn.prepare_cached("SELECT zettel_id, link_id FROM link ORDER BY zettel_id, link_id")?;
    let pairs = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    pairs
        .into_iter()
        .map(|(from, to)| Ok(LinkEdge::new(parse_id(&from)?, parse_id(&to)?)))
        .collect()
}

pub(crate) fn id_exists(conn: &Connection, id: &NoteId) -> IndexResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT EXISTS(SELECT 1 FROM zettel WHERE id = ?1)")?;
    Ok(stmt.query_row([id.as_str()], |row| row.get(0))?)
}

/// Timestamps are stored as RFC 3339 UTC with milliseconds, which sorts
/// lexicographically.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn path_text(path: &Path) -> IndexResult<&str> {
    path.to_str().ok_or_else(|| {
        IndexError::InvalidQuery(format!("path is not valid UTF-8: {}", path.display()))
    })
}

fn parse_id(s: &str) -> IndexResult<NoteId> {
    s.parse()
        .map_err(|e| IndexError::InvalidRow(format!("invalid note id in database: {}", e)))
}

fn parse_timestamp(s: &str) -> IndexResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IndexError::InvalidRow(format!("invalid timestamp '{}': {}", s, e)))
}

/// Maps FTS5 syntax errors to `InvalidQuery`, everything else to `Database`.
pub(crate) fn search_error(e: rusqlite::Error) -> IndexError {
    let msg = e.to_string();
    if msg.contains("fts5") || msg.contains("syntax") {
        IndexError::InvalidQuery(format!("invalid search query: {}", e))
    } else {
        IndexError::Database(e)
    }
}
