//! Builder for test notes with sensible defaults.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use zet::domain::NoteId;
use zet::infra::{note_filename, slugify};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Builder for note files written straight into a notes root.
#[derive(Debug, Clone)]
pub struct TestNote {
    id: NoteId,
    title: String,
    body: String,
}

impl TestNote {
    /// A note with a process-unique id and an empty body.
    pub fn new(title: impl Into<String>) -> Self {
        let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("20240101000000{:05}", n).parse().expect("valid id"),
            title: title.into(),
            body: String::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.parse().expect("Invalid NoteId");
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn get_id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// `<slug>.<id>.md` for the current title.
    pub fn filename(&self) -> String {
        note_filename(&slugify(&self.title), &self.id)
    }

    pub fn content(&self) -> String {
        format!("# {}\n\n{}", self.title, self.body)
    }
}
