use anyhow::{Context, Result, bail};
use std::io::Write;

use super::ConsoleReporter;
use crate::cli::output::Printer;
use crate::index::ZettelRepository;
use crate::sync::SyncEngine;

/// Runs a full sync. Files that failed are listed on stderr and make the
/// command exit non-zero after the rest of the index was updated.
pub fn handle_sync<R: ZettelRepository, W: Write>(
    engine: &mut SyncEngine<R>,
    printer: &mut Printer<W>,
    verbose: bool,
) -> Result<()> {
    let mut reporter = ConsoleReporter::new(verbose);
    let report = engine.sync(&mut reporter).context("sync failed")?;
    printer.report(&report)?;

    if report.has_errors() {
        bail!("{} file(s) could not be synced", report.errors.len());
    }
    Ok(())
}
