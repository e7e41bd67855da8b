//! Note body templates rendered with minijinja.

use crate::domain::{NoteId, default_content};
use chrono::Utc;
use minijinja::{Environment, context};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Template file used for new notes, looked up in the templates directory.
pub const NOTE_TEMPLATE: &str = "zet.tmpl.md";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders the body of a new note.
///
/// The template sees `title`, `id` and `date` (YYYY-MM-DD). Without a
/// template file the minimal `# <title>` body is used.
pub fn render_note_body(
    templates_dir: &Path,
    title: &str,
    id: &NoteId,
) -> Result<String, TemplateError> {
    let path = templates_dir.join(NOTE_TEMPLATE);
    if !path.is_file() {
        return Ok(default_content(title));
    }

    let source = std::fs::read_to_string(&path).map_err(|e| TemplateError::Read {
        path: path.clone(),
        source: e,
    })?;

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.render_str(
        &source,
        context! {
            title => title,
            id => id.as_str(),
            date => Utc::now().format("%Y-%m-%d").to_string(),
        },
    )
    .map_err(|e| TemplateError::Render { path, source: e })
}
