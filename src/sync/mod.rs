//! Synchronization between the note files and the index.

mod broken;
mod engine;
mod error;
mod report;


pub use broken::{BrokenKind, BrokenLink, note_broken_links, resolve_existing, scan_broken_links};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use report::{FileError, FileResult, NoopReporter, ProgressReporter, SyncReport, Unresolved};
