//! Slug generation and the `<slug>.<id>.md` filename scheme.

use crate::domain::NoteId;
use std::path::Path;

/// Extension shared by every note file.
pub const NOTE_EXTENSION: &str = "md";

/// Converts a title to a filename-safe slug.
///
/// - Converts to lowercase
/// - Keeps letters and digits (including non-ASCII letters)
/// - Replaces every other character with a hyphen
/// - Collapses consecutive hyphens
/// - Trims leading/trailing hyphens
/// - Truncates to 80 characters (at a hyphen if possible)
/// - Returns "untitled" for empty results
///
/// # Examples
///
/// ```
/// use zet::infra::slugify;
///
/// assert_eq!(slugify("API Design"), "api-design");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify(""), "untitled");
/// ```
pub fn slugify(title: &str) -> String {
    const MAX_CHARS: usize = 80;

    let mut collapsed = String::with_capacity(title.len());
    let mut prev_was_hyphen = true;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            collapsed.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            collapsed.push('-');
            prev_was_hyphen = true;
        }
    }

    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        return "untitled".to_string();
    }

    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }

    let truncated: String = trimmed.chars().take(MAX_CHARS).collect();
    if let Some(last_hyphen) = truncated.rfind('-')
        && last_hyphen > truncated.len() / 2
    {
        return truncated[..last_hyphen].to_string();
    }
    truncated.trim_end_matches('-').to_string()
}

/// Returns true if `s` is already in slug form.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty() && slugify(s) == s
}

/// Normalizes a raw `[[reference]]` target to the slug it should resolve to.
///
/// Targets already in slug form are kept; human-readable titles are
/// slugified. Blank targets have no slug.
pub fn reference_slug(reference: &str) -> Option<String> {
    if reference.trim().is_empty() {
        return None;
    }
    if is_slug(reference) {
        Some(reference.to_string())
    } else {
        Some(slugify(reference))
    }
}

/// Builds the filename for a note.
///
/// # Examples
///
/// ```
/// use zet::domain::NoteId;
/// use zet::infra::note_filename;
///
/// let id: NoteId = "20240115103000".parse().unwrap();
/// assert_eq!(note_filename("api-design", &id), "api-design.20240115103000.md");
/// ```
pub fn note_filename(slug: &str, id: &NoteId) -> String {
    format!("{}.{}.{}", slug, id, NOTE_EXTENSION)
}

/// Extracts the id segment from a note filename.
///
/// Returns `None` when the file is not a `.md` file or carries no
/// parseable id between the last two dots.
pub fn parse_filename(path: &Path) -> Option<NoteId> {
    if path.extension()? != NOTE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (_, id) = stem.rsplit_once('.')?;
    id.parse().ok()
}
