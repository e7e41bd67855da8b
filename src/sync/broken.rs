//! Broken-link scan over every indexed note.

use crate::domain::{Note, scan_references, title_from_content};
use crate::index::{IndexError, IndexResult, ZettelRepository};
use crate::infra::{Vault, slugify};
use log::warn;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why a reference is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokenKind {
    /// `[[]]` with nothing (or only whitespace) inside.
    Empty,
    /// Matches neither a note id nor a note slug, or the note's file is gone.
    Unresolved,
    /// The note's own file could not be read.
    Unreadable,
}

impl fmt::Display for BrokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokenKind::Empty => f.write_str("empty"),
            BrokenKind::Unresolved => f.write_str("unresolved"),
            BrokenKind::Unreadable => f.write_str("unreadable"),
        }
    }
}

/// One broken reference inside a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    pub path: PathBuf,
    pub reference: String,
    /// 1-based line number of the reference, 0 for an unreadable file.
    pub line: usize,
    pub kind: BrokenKind,
}

impl fmt::Display for BrokenLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == BrokenKind::Unreadable {
            return write!(f, "{}: unreadable note file", self.path.display());
        }
        write!(
            f,
            "{}:{}: {} reference [[{}]]",
            self.path.display(),
            self.line,
            self.kind,
            self.reference
        )
    }
}

/// Resolves a raw reference to an indexed note whose file still exists.
///
/// A row left behind by a file deleted outside zet is reported as NotFound,
/// exactly like a reference that matches nothing.
pub fn resolve_existing<R: ZettelRepository + ?Sized>(
    repo: &R,
    vault: &Vault,
    reference: &str,
) -> IndexResult<Note> {
    let note = repo.resolve(reference)?;
    if !vault.exists(note.path()) {
        return Err(IndexError::NotFound {
            key: format!(
                "reference '{}' (file missing: {})",
                reference,
                note.path().display()
            ),
        });
    }
    Ok(note)
}

/// Checks every reference in the file of `note` as it is on disk now.
///
/// A file that cannot be read is reported as a single `Unreadable` entry.
pub fn note_broken_links<R: ZettelRepository + ?Sized>(
    repo: &R,
    vault: &Vault,
    note: &Note,
) -> IndexResult<Vec<BrokenLink>> {
    let content = match vault.read(note.path()) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                "event=broken_scan_unreadable path={} error={}",
                note.path().display(),
                e
            );
            return Ok(vec![BrokenLink {
                path: note.path().to_path_buf(),
                reference: String::new(),
                line: 0,
                kind: BrokenKind::Unreadable,
            }]);
        }
    };
    // the title may have changed since the note was indexed
    let own_slug = title_from_content(&content).map(|title| slugify(&title));

    let mut broken = Vec::new();
    for reference in scan_references(&content) {
        let kind = if reference.target.trim().is_empty() {
            BrokenKind::Empty
        } else if note.is_self_reference(&reference.target)
            || own_slug.as_deref() == Some(reference.target.as_str())
        {
            continue;
        } else {
            match resolve_existing(repo, vault, &reference.target) {
                Ok(_) => continue,
                Err(e) if e.is_not_found() => BrokenKind::Unresolved,
                Err(e) => return Err(e),
            }
        };
        broken.push(BrokenLink {
            path: note.path().to_path_buf(),
            reference: reference.target,
            line: reference.line,
            kind,
        });
    }
    Ok(broken)
}

/// Full scan, ordered by note path then line.
pub fn scan_broken_links<R: ZettelRepository + ?Sized>(
    repo: &R,
    vault: &Vault,
) -> IndexResult<Vec<BrokenLink>> {
    let mut notes = repo.list_all()?;
    notes.sort_by(|a, b| a.path().cmp(b.path()));

    let mut broken = Vec::new();
    for note in &notes {
        broken.extend(note_broken_links(repo, vault, note)?);
    }
    Ok(broken)
}
