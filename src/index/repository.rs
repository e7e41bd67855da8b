//! ZettelRepository trait, error type, and the shared save defaults.

use crate::domain::{
    IdGenerator, LinkEdge, Note, NoteDraft, NoteError, NoteId, NoteKey, NoteKind, default_content,
};
use crate::infra::{Vault, note_filename, reference_slug, slugify};
use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of entries `history()` ever returns.
pub const HISTORY_LIMIT: usize = 50;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No note matches the lookup. Recoverable: broken-link scans treat it
    /// as "target missing".
    #[error("note not found: {key}")]
    NotFound { key: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The query is invalid.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The note handed to the index is invalid.
    #[error(transparent)]
    InvalidNote(#[from] NoteError),

    /// The write would give two notes the same path.
    #[error("path {path} already belongs to note {owner}")]
    Conflict { path: PathBuf, owner: NoteId },

    /// A stored row could not be turned back into a note.
    #[error("invalid row in index: {0}")]
    InvalidRow(String),

    /// The database was written by a newer version of zet.
    #[error("index schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IndexError {
    pub(crate) fn not_found(key: &NoteKey) -> Self {
        IndexError::NotFound {
            key: key.to_string(),
        }
    }

    /// Returns true for the distinguished NotFound condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound { .. })
    }
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Repository for the relational note index.
///
/// Every operation is independently atomic. Writes that touch several rows
/// run in a single transaction, so a failing batch leaves no partial state.
pub trait ZettelRepository {
    /// Resolves a note by id, path, or slug and populates its outbound links.
    fn get(&self, key: &NoteKey) -> IndexResult<Note>;

    /// Upserts a note by id, filling in missing fields first.
    ///
    /// Re-applying the same note is a no-op: `updated_at` only moves when a
    /// stored field actually changed.
    fn save(&mut self, draft: NoteDraft) -> IndexResult<Note>;

    /// Upserts a batch of notes in one transaction.
    fn save_bulk(&mut self, drafts: Vec<NoteDraft>) -> IndexResult<Vec<Note>>;

    /// Adds edges `note -> target`, ignoring existing ones, and refreshes
    /// `note`'s outbound links.
    fn link(&mut self, note: &mut Note, targets: &[NoteId]) -> IndexResult<()>;

    /// Adds pre-computed edges, ignoring existing ones.
    fn link_bulk(&mut self, edges: &[LinkEdge]) -> IndexResult<()>;

    /// Deletes edges `note -> target` and refreshes `note`'s outbound links.
    fn unlink(&mut self, note: &mut Note, targets: &[NoteId]) -> IndexResult<()>;

    /// Deletes pre-computed edges.
    fn unlink_bulk(&mut self, edges: &[LinkEdge]) -> IndexResult<()>;

    /// Returns every edge, ordered by source then target.
    fn edges(&self) -> IndexResult<Vec<LinkEdge>>;

    /// Deletes a note, its edges and its history entry.
    ///
    /// Returns `IndexError::NotFound` if no row was deleted.
    fn remove(&mut self, id: &NoteId) -> IndexResult<()>;

    /// Deletes a batch of notes, returning how many rows were removed.
    fn remove_bulk(&mut self, ids: &[NoteId]) -> IndexResult<usize>;

    /// Notes with an edge pointing at `id`.
    fn backlinks(&self, id: &NoteId) -> IndexResult<Vec<Note>>;

    /// Fleet notes, most recently updated first.
    fn list_fleet(&self) -> IndexResult<Vec<Note>>;

    /// Permanent notes, most recently updated first.
    fn list_permanent(&self) -> IndexResult<Vec<Note>>;

    /// All notes, most recently updated first.
    fn list_all(&self) -> IndexResult<Vec<Note>>;

    /// Most recently touched notes first, at most [`HISTORY_LIMIT`].
    fn history(&self) -> IndexResult<Vec<Note>>;

    /// Marks a note as touched now.
    fn insert_history(&mut self, id: &NoteId) -> IndexResult<()>;

    /// The most recently touched note.
    fn last_opened(&self) -> IndexResult<Note>;

    /// Full-text search over title and content, best match first.
    fn search(&self, query: &str) -> IndexResult<Vec<Note>>;

    /// Deletes every note row.
    fn reset(&mut self) -> IndexResult<()>;

    /// Resolves a raw `[[reference]]` target: by id first, then by slug.
    fn resolve(&self, reference: &str) -> IndexResult<Note> {
        if let Ok(id) = reference.parse::<NoteId>() {
            match self.get(&NoteKey::Id(id)) {
                Err(e) if e.is_not_found() => {}
                other => return other,
            }
        }

        let slug = reference_slug(reference).ok_or_else(|| IndexError::NotFound {
            key: format!("reference '{}'", reference),
        })?;
        self.get(&NoteKey::Slug(slug))
    }
}

/// Fills in the defaults of a draft and validates it.
///
/// `fresh_id` is only called when the draft carries no id.
pub(crate) fn complete_draft(
    draft: NoteDraft,
    vault: &Vault,
    fresh_id: impl FnOnce() -> IndexResult<NoteId>,
) -> IndexResult<Note> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(NoteError::EmptyTitle.into());
    }

    let id = match draft.id {
        Some(id) => id,
        None => fresh_id()?,
    };

    let (path, kind) = match draft.path {
        Some(path) => {
            let kind = vault.kind_of(&path)?;
            (path, kind)
        }
        None => {
            let kind = draft.kind.unwrap_or(NoteKind::Fleet);
            let path = vault
                .area_root(kind)
                .join(note_filename(&slugify(&title), &id));
            (path, kind)
        }
    };

    let content = draft.content.unwrap_or_else(|| default_content(&title));
    Ok(Note::new(id, title, content, path, kind)?)
}

/// Draws ids from `ids` until one is not already stored.
pub(crate) fn unused_id(
    ids: &mut IdGenerator,
    exists: impl Fn(&NoteId) -> IndexResult<bool>,
) -> IndexResult<NoteId> {
    loop {
        let id = ids.next_id();
        if !exists(&id)? {
            return Ok(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn vault() -> (TempDir, Vault) {
        let dir = TempDir::new().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        (dir, vault)
    }

    fn fixed_id() -> IndexResult<NoteId> {
        Ok("7".parse().unwrap())
    }

    #[test]
    fn not_found_displays_key() {
        let err = IndexError::not_found(&NoteKey::Slug("missing-note".into()));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing-note"));
    }

    #[test]
    fn database_error_is_not_not_found() {
        let err = IndexError::Database(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_not_found());
    }

    #[test]
    fn complete_draft_fills_defaults() {
        let (_dir, vault) = vault();
        let note = complete_draft(NoteDraft::titled("Testing Zettel"), &vault, fixed_id).unwrap();

        assert_eq!(note.id().as_str(), "7");
        assert_eq!(note.kind(), NoteKind::Fleet);
        assert_eq!(note.content(), "# Testing Zettel\n\n\n");
        assert_eq!(note.path(), vault.fleet_root().join("testing-zettel.7.md"));
    }

    #[test]
    fn complete_draft_uses_requested_area() {
        let (_dir, vault) = vault();
        let draft = NoteDraft::titled("Kept").kind(NoteKind::Permanent);
        let note = complete_draft(draft, &vault, fixed_id).unwrap();
        assert_eq!(note.path(), vault.permanent_root().join("kept.7.md"));
    }

    #[test]
    fn complete_draft_derives_kind_from_path() {
        let (_dir, vault) = vault();
        let draft = NoteDraft::titled("Kept")
            .path(vault.permanent_root().join("kept.9.md"))
            .kind(NoteKind::Fleet);
        let note = complete_draft(draft, &vault, fixed_id).unwrap();
        assert_eq!(note.kind(), NoteKind::Permanent);
    }

    #[test]
    fn complete_draft_keeps_given_id() {
        let (_dir, vault) = vault();
        let draft = NoteDraft::titled("Mine").id("99".parse().unwrap());
        let note = complete_draft(draft, &vault, || panic!("id should not be generated")).unwrap();
        assert_eq!(note.id().as_str(), "99");
    }

    #[test]
    fn complete_draft_rejects_empty_title() {
        let (_dir, vault) = vault();
        let err = complete_draft(NoteDraft::titled("  "), &vault, fixed_id).unwrap_err();
        assert!(matches!(err, IndexError::InvalidNote(NoteError::EmptyTitle)));
    }

    #[test]
    fn complete_draft_rejects_path_outside_areas() {
        let (_dir, vault) = vault();
        let draft = NoteDraft::titled("Stray").path(vault.root().join("stray.1.md"));
        let err = complete_draft(draft, &vault, fixed_id).unwrap_err();
        assert!(matches!(err, IndexError::InvalidNote(NoteError::OutsideAreas { .. })));
    }

    #[test]
    fn unused_id_skips_existing() {
        let mut ids = IdGenerator::new();
        let calls = std::cell::Cell::new(0);
        let id = unused_id(&mut ids, |_| {
            calls.set(calls.get() + 1);
            Ok(calls.get() < 3)
        })
        .unwrap();
        assert_eq!(calls.get(), 3);
        assert!(ids.is_taken(&id));
    }
}
