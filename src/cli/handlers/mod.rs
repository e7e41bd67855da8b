//! Command handlers for the CLI.

mod completions;
mod editor;
mod links;
mod lists;
mod notes;
mod sync;


use std::path::Path;

use crate::sync::{FileResult, ProgressReporter, SyncReport};

// Re-export public items
pub use completions::handle_completions;
pub use editor::{EditorLauncher, SystemEditor};
pub use links::{handle_backlinks, handle_broken_links, handle_links};
pub use lists::{handle_backlog, handle_history, handle_search};
pub use notes::{handle_last, handle_new, handle_open, handle_promote, handle_remove, handle_save};
pub use sync::handle_sync;

// ===========================================
// Shared Utilities
// ===========================================

/// Progress reporter that prints to stderr, keeping stdout for paths.
pub(crate) struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub(crate) fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_file(&mut self, path: &Path, result: FileResult) {
        match result {
            FileResult::Indexed if self.verbose => eprintln!("  indexed: {}", path.display()),
            FileResult::Indexed => {}
            FileResult::Renamed(to) => {
                eprintln!("  renamed: {} -> {}", path.display(), to.display())
            }
            FileResult::Error(msg) => eprintln!("  error: {}: {}", path.display(), msg),
        }
    }

    fn on_complete(&mut self, report: &SyncReport) {
        eprintln!(
            "Synced {} notes ({} renamed, {} removed, {} links added, {} links dropped)",
            report.saved, report.renamed, report.removed, report.linked, report.unlinked
        );
        if !report.unresolved.is_empty() {
            eprintln!("{} references could not be resolved", report.unresolved.len());
        }
    }
}
