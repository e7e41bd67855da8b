//! Sync results and progress reporting.

use crate::domain::NoteId;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ===========================================
// Per-file Errors
// ===========================================

/// A file that could not be synced. The rest of the sync carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for FileError {}

/// A reference that matched no note. Logged and skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub from: NoteId,
    pub reference: String,
}

// ===========================================
// SyncReport
// ===========================================

/// Outcome of a full `sync()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Files found under both areas.
    pub scanned: usize,
    /// Notes that were given a fresh id.
    pub created: usize,
    /// Files renamed to match their title and id.
    pub renamed: usize,
    /// Notes upserted into the index.
    pub saved: usize,
    /// Edges added.
    pub linked: usize,
    /// Stale edges removed.
    pub unlinked: usize,
    /// Index rows removed because their file is gone.
    pub removed: usize,
    pub errors: Vec<FileError>,
    pub unresolved: Vec<Unresolved>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ===========================================
// Progress Reporting
// ===========================================

/// Result of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    /// File was read and queued for the index.
    Indexed,
    /// File was renamed to its expected name.
    Renamed(PathBuf),
    /// File was skipped because of an error.
    Error(String),
}

/// Receives progress updates during a sync.
pub trait ProgressReporter {
    /// Called once per scanned file.
    fn on_file(&mut self, path: &Path, result: FileResult);
    /// Called when the sync is complete.
    fn on_complete(&mut self, report: &SyncReport);
}

/// A no-op progress reporter.
#[derive(Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_file(&mut self, _path: &Path, _result: FileResult) {}
    fn on_complete(&mut self, _report: &SyncReport) {}
}
