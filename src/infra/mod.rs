//! Filesystem access, slugs, and note templates

mod fs;
mod slug;
mod template;

pub use fs::{FLEET_DIR, FsError, PERMANENT_DIR, TEMPLATES_DIR, Vault};
pub use slug::{NOTE_EXTENSION, is_slug, note_filename, parse_filename, reference_slug, slugify};
pub use template::{NOTE_TEMPLATE, TemplateError, render_note_body};
