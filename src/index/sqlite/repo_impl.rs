//! ZettelRepository implementation for SqliteIndex.

use super::SqliteIndex;
use super::rows::{
    NOTE_COLUMNS, NoteRow, id_exists, path_text, query_edges, query_note, query_notes, search_error,
    timestamp,
};
use crate::domain::{LinkEdge, Note, NoteDraft, NoteId, NoteKey, NoteKind};
use crate::index::repository::{complete_draft, unused_id};
use crate::index::{HISTORY_LIMIT, IndexError, IndexResult, ZettelRepository};
use chrono::Utc;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

// Only touches updated_at when a stored field actually differs, which keeps
// repeated syncs from reordering the lists.
const UPSERT_SQL: &str = "
INSERT INTO zettel (id, slug, title, content, path, type, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
ON CONFLICT(id) DO UPDATE SET
    slug = excluded.slug,
    title = excluded.title,
    content = excluded.content,
    path = excluded.path,
    type = excluded.type,
    updated_at = excluded.updated_at
WHERE zettel.title IS NOT excluded.title
   OR zettel.content IS NOT excluded.content
   OR zettel.path IS NOT excluded.path
   OR zettel.type IS NOT excluded.type";

const LINK_SQL: &str = "INSERT INTO link (zettel_id, link_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
     ON CONFLICT(zettel_id, link_id) DO NOTHING";

const UNLINK_SQL: &str = "DELETE FROM link WHERE zettel_id = ?1 AND link_id = ?2";

fn upsert(conn: &Connection, note: &Note, now: &str) -> IndexResult<()> {
    let path = path_text(note.path())?;
    let owner: Option<String> = conn
        .prepare_cached("SELECT id FROM zettel WHERE path = ?1 AND id <> ?2")?
        .query_row([path, note.id().as_str()], |row| row.get(0))
        .optional()?;
    if let Some(owner) = owner {
        return Err(IndexError::Conflict {
            path: note.path().to_path_buf(),
            owner: owner
                .parse()
                .map_err(|e| IndexError::InvalidRow(format!("invalid note id in database: {}", e)))?,
        });
    }

    let mut stmt = conn.prepare_cached(UPSERT_SQL)?;
    stmt.execute(params![
        note.id().as_str(),
        note.slug(),
        note.title(),
        note.content(),
        path,
        note.kind().as_str(),
        now,
    ])?;
    Ok(())
}

impl SqliteIndex {
    fn find(&self, key: &NoteKey) -> IndexResult<Option<Note>> {
        match key {
            NoteKey::Id(id) => query_note(
                &self.conn,
                &format!("SELECT {NOTE_COLUMNS} FROM zettel z WHERE z.id = ?1"),
                [id.as_str()],
            ),
            NoteKey::Path(path) => query_note(
                &self.conn,
                &format!("SELECT {NOTE_COLUMNS} FROM zettel z WHERE z.path = ?1"),
                [path_text(path)?],
            ),
            // Several notes may share a title; the most recently updated wins.
            NoteKey::Slug(slug) => query_note(
                &self.conn,
                &format!(
                    "SELECT {NOTE_COLUMNS} FROM zettel z WHERE z.slug = ?1
                     ORDER BY z.updated_at DESC, z.id DESC LIMIT 1"
                ),
                [slug.as_str()],
            ),
        }
    }

    fn outbound(&self, id: &NoteId) -> IndexResult<Vec<Note>> {
        query_notes(
            &self.conn,
            &format!(
                "SELECT {NOTE_COLUMNS} FROM link l JOIN zettel z ON z.id = l.link_id
                 WHERE l.zettel_id = ?1 ORDER BY l.rowid"
            ),
            [id.as_str()],
        )
    }

    fn list_kind(&self, kind: NoteKind) -> IndexResult<Vec<Note>> {
        query_notes(
            &self.conn,
            &format!(
                "SELECT {NOTE_COLUMNS} FROM zettel z WHERE z.type = ?1
                 ORDER BY z.updated_at DESC, z.id DESC"
            ),
            [kind.as_str()],
        )
    }

    fn complete(&mut self, draft: NoteDraft) -> IndexResult<Note> {
        let conn = &self.conn;
        let ids = &mut self.ids;
        complete_draft(draft, &self.vault, || {
            unused_id(ids, |id| id_exists(conn, id))
        })
    }

    fn write_edges(&self, edges: &[LinkEdge], op: EdgeOp) -> IndexResult<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let now = timestamp(Utc::now());
        let tx = self.transaction()?;
        {
            let mut stmt = tx.prepare(op.sql())?;
            for edge in edges {
                match op {
                    EdgeOp::Link => stmt.execute(params![edge.from.as_str(), edge.to.as_str(), now])?,
                    EdgeOp::Unlink => stmt.execute(params![edge.from.as_str(), edge.to.as_str()])?,
                };
            }
        }
        tx.commit()
    }
}

#[derive(Clone, Copy)]
enum EdgeOp {
    Link,
    Unlink,
}

impl EdgeOp {
    fn sql(self) -> &'static str {
        match self {
            EdgeOp::Link => LINK_SQL,
            EdgeOp::Unlink => UNLINK_SQL,
        }
    }
}

impl ZettelRepository for SqliteIndex {
    fn get(&self, key: &NoteKey) -> IndexResult<Note> {
        let mut note = self.find(key)?.ok_or_else(|| IndexError::not_found(key))?;
        let links = self.outbound(note.id())?;
        note.set_links(links);
        Ok(note)
    }

    fn save(&mut self, draft: NoteDraft) -> IndexResult<Note> {
        let note = self.complete(draft)?;
        upsert(&self.conn, &note, &timestamp(Utc::now()))?;
        debug!("event=note_saved id={} path={}", note.id(), note.path().display());
        self.get(&NoteKey::Id(note.id().clone()))
    }

    fn save_bulk(&mut self, drafts: Vec<NoteDraft>) -> IndexResult<Vec<Note>> {
        let notes = drafts
            .into_iter()
            .map(|draft| self.complete(draft))
            .collect::<IndexResult<Vec<_>>>()?;

        let now = timestamp(Utc::now());
        let tx = self.transaction()?;
        for note in &notes {
            upsert(tx.conn(), note, &now)?;
        }
        tx.commit()?;
        debug!("event=notes_saved count={}", notes.len());

        notes
            .iter()
            .map(|note| self.get(&NoteKey::Id(note.id().clone())))
            .collect()
    }

    fn link(&mut self, note: &mut Note, targets: &[NoteId]) -> IndexResult<()> {
        let edges: Vec<LinkEdge> = targets
            .iter()
            .map(|to| LinkEdge::new(note.id().clone(), to.clone()))
            .collect();
        self.write_edges(&edges, EdgeOp::Link)?;
        note.set_links(self.outbound(note.id())?);
        Ok(())
    }

    fn link_bulk(&mut self, edges: &[LinkEdge]) -> IndexResult<()> {
        self.write_edges(edges, EdgeOp::Link)
    }

    fn unlink(&mut self, note: &mut Note, targets: &[NoteId]) -> IndexResult<()> {
        let edges: Vec<LinkEdge> = targets
            .iter()
            .map(|to| LinkEdge::new(note.id().clone(), to.clone()))
            .collect();
        self.write_edges(&edges, EdgeOp::Unlink)?;
        note.set_links(self.outbound(note.id())?);
        Ok(())
    }

    fn unlink_bulk(&mut self, edges: &[LinkEdge]) -> IndexResult<()> {
        self.write_edges(edges, EdgeOp::Unlink)
    }

    fn edges(&self) -> IndexResult<Vec<LinkEdge>> {
        query_edges(&self.conn)
    }

    fn remove(&mut self, id: &NoteId) -> IndexResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM zettel WHERE id = ?1", [id.as_str()])?;
        if removed == 0 {
            return Err(IndexError::not_found(&NoteKey::Id(id.clone())));
        }
        debug!("event=note_removed id={}", id);
        Ok(())
    }

    fn remove_bulk(&mut self, ids: &[NoteId]) -> IndexResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM zettel WHERE id = ?1")?;
            for id in ids {
                removed += stmt.execute([id.as_str()])?;
            }
        }
        tx.commit()?;
        debug!("event=notes_removed count={}", removed);
        Ok(removed)
    }

    fn backlinks(&self, id: &NoteId) -> IndexResult<Vec<Note>> {
        query_notes(
            &self.conn,
            &format!(
                "SELECT {NOTE_COLUMNS} FROM link l JOIN zettel z ON z.id = l.zettel_id
                 WHERE l.link_id = ?1 ORDER BY z.updated_at DESC, z.id DESC"
            ),
            [id.as_str()],
        )
    }

    fn list_fleet(&self) -> IndexResult<Vec<Note>> {
        self.list_kind(NoteKind::Fleet)
    }

    fn list_permanent(&self) -> IndexResult<Vec<Note>> {
        self.list_kind(NoteKind::Permanent)
    }

    fn list_all(&self) -> IndexResult<Vec<Note>> {
        query_notes(
            &self.conn,
            &format!("SELECT {NOTE_COLUMNS} FROM zettel z ORDER BY z.updated_at DESC, z.id DESC"),
            [],
        )
    }

    fn history(&self) -> IndexResult<Vec<Note>> {
        query_notes(
            &self.conn,
            &format!(
                "SELECT {NOTE_COLUMNS} FROM history h JOIN zettel z ON z.id = h.zettel_id
                 ORDER BY h.touched DESC LIMIT ?1"
            ),
            [HISTORY_LIMIT as i64],
        )
    }

    fn insert_history(&mut self, id: &NoteId) -> IndexResult<()> {
        // `touched` is a monotonic counter so entries touched within the same
        // millisecond still order deterministically.
        let touched = self.conn.execute(
            "INSERT INTO history (zettel_id, touched, updated_at)
             SELECT z.id, (SELECT COALESCE(MAX(touched), 0) + 1 FROM history), ?2
             FROM zettel z WHERE z.id = ?1
             ON CONFLICT(zettel_id) DO UPDATE SET
                 touched = excluded.touched,
                 updated_at = excluded.updated_at",
            params![id.as_str(), timestamp(Utc::now())],
        )?;
        if touched == 0 {
            return Err(IndexError::not_found(&NoteKey::Id(id.clone())));
        }
        Ok(())
    }

    fn last_opened(&self) -> IndexResult<Note> {
        query_note(
            &self.conn,
            &format!(
                "SELECT {NOTE_COLUMNS} FROM history h JOIN zettel z ON z.id = h.zettel_id
                 ORDER BY h.touched DESC LIMIT 1"
            ),
            [],
        )?
        .ok_or_else(|| IndexError::NotFound {
            key: "history entry".to_string(),
        })
    }

    fn search(&self, query: &str) -> IndexResult<Vec<Note>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Weights: title=10, content=1. Lower bm25 is a better match.
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {NOTE_COLUMNS} FROM zettel_fts
                 JOIN zettel z ON z.rowid = zettel_fts.rowid
                 WHERE zettel_fts MATCH ?1
                 ORDER BY bm25(zettel_fts, 10.0, 1.0), z.id"
            ))
            .map_err(search_error)?;

        let rows = stmt
            .query_map([query], NoteRow::from_row)
            .map_err(search_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(search_error)?;

        rows.into_iter().map(NoteRow::into_note).collect()
    }

    fn reset(&mut self) -> IndexResult<()> {
        let tx = self.transaction()?;
        tx.conn()
            .execute_batch("DELETE FROM history; DELETE FROM link; DELETE FROM zettel;")?;
        tx.commit()?;
        debug!("event=index_reset");
        Ok(())
    }
}
