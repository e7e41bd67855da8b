//! Core types: Note, NoteId, inline references and link edges

mod link;
mod note;
mod note_id;

pub use link::{LinkEdge, Reference, extract_references, scan_references};
pub use note::{Note, NoteDraft, NoteError, NoteKey, NoteKind, default_content, title_from_content};
pub use note_id::{IdGenerator, NoteId, ParseNoteIdError};
