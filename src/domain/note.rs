//! Note model: identity, title, raw content, area, and resolved links.

use crate::domain::{NoteId, extract_references};
use crate::infra::{note_filename, slugify};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that make a note invalid. Callers must not proceed with such a note.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("invalid note: title cannot be empty")]
    EmptyTitle,

    #[error("invalid note: {path} is not under the fleet or permanent area")]
    OutsideAreas { path: PathBuf },

    #[error("invalid note: file does not exist: {path}")]
    Missing { path: PathBuf },

    #[error("invalid note type '{0}': expected 'fleet' or 'permanent'")]
    InvalidKind(String),
}

/// The area a note lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Transient, not yet curated notes.
    #[default]
    Fleet,
    /// Curated, stable notes.
    Permanent,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Fleet => "fleet",
            NoteKind::Permanent => "permanent",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteKind {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fleet" => Ok(NoteKind::Fleet),
            "permanent" => Ok(NoteKind::Permanent),
            other => Err(NoteError::InvalidKind(other.to_string())),
        }
    }
}

/// How a note is looked up in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteKey {
    Id(NoteId),
    Path(PathBuf),
    Slug(String),
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteKey::Id(id) => write!(f, "id {}", id),
            NoteKey::Path(path) => write!(f, "path {}", path.display()),
            NoteKey::Slug(slug) => write!(f, "slug {}", slug),
        }
    }
}

/// Returns the title encoded in the first line of `content`.
///
/// Leading heading markers and surrounding whitespace are stripped.
/// Returns `None` when the first line carries no title.
pub fn title_from_content(content: &str) -> Option<String> {
    let first = content.lines().next()?;
    let title = first.trim_start().trim_start_matches('#').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// A single note.
///
/// The slug is always derived from the title, and the filename expected on
/// disk is `<slug>.<id>.md`. `links` holds outbound targets as resolved by
/// the index; notes read from disk start with no links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    id: NoteId,
    title: String,
    slug: String,
    #[serde(skip)]
    content: String,
    path: PathBuf,
    #[serde(rename = "type")]
    kind: NoteKind,
    #[serde(skip)]
    links: Vec<Note>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Creates a note from its parts, deriving the slug from the title.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::EmptyTitle` if the title is empty or whitespace-only.
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
        path: PathBuf,
        kind: NoteKind,
    ) -> Result<Self, NoteError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteError::EmptyTitle);
        }

        Ok(Self {
            id,
            slug: slugify(title),
            title: title.to_string(),
            content: content.into(),
            path,
            kind,
            links: Vec::new(),
            created_at: None,
            updated_at: None,
        })
    }

    /// Creates a note from file content, taking the title from line 0.
    pub fn from_content(
        id: NoteId,
        content: impl Into<String>,
        path: PathBuf,
        kind: NoteKind,
    ) -> Result<Self, NoteError> {
        let content = content.into();
        let title = title_from_content(&content).ok_or(NoteError::EmptyTitle)?;
        Self::new(id, title, content, path, kind)
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Iterates over the content line by line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    /// Outbound links as last resolved by the index.
    pub fn links(&self) -> &[Note] {
        &self.links
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Raw outbound references, excluding the note's own slug and id.
    pub fn references(&self) -> Vec<String> {
        extract_references(&self.content, &[self.slug.as_str(), self.id.as_str()])
    }

    /// The filename this note should have, derived from its current title.
    pub fn expected_filename(&self) -> String {
        note_filename(&self.slug, &self.id)
    }

    /// Whether `reference` points at this note itself.
    pub fn is_self_reference(&self, reference: &str) -> bool {
        reference == self.slug || reference == self.id.as_str()
    }

    pub(crate) fn set_path(&mut self, path: PathBuf, kind: NoteKind) {
        self.path = path;
        self.kind = kind;
    }

    pub(crate) fn set_links(&mut self, links: Vec<Note>) {
        self.links = links;
    }

    pub(crate) fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    /// Compares the persisted fields, ignoring links and timestamps.
    pub fn same_record(&self, other: &Note) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.content == other.content
            && self.path == other.path
            && self.kind == other.kind
    }
}

/// A note as handed to `save`, where any field but the title may be absent.
///
/// Missing fields are filled in by the index: a fresh id, a fleet path built
/// from slug and id, a minimal body, and the fleet area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub id: Option<NoteId>,
    pub path: Option<PathBuf>,
    pub content: Option<String>,
    pub kind: Option<NoteKind>,
}

impl NoteDraft {
    /// A draft with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn kind(mut self, kind: NoteKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            id: Some(note.id.clone()),
            path: Some(note.path.clone()),
            content: Some(note.content.clone()),
            kind: Some(note.kind),
        }
    }
}

/// Minimal body for a note created without content.
pub fn default_content(title: &str) -> String {
    format!("# {}\n\n\n", title)
}
