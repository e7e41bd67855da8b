//! Listing commands: search, history, backlog.

use anyhow::{Context, Result};
use std::io::Write;

use crate::cli::SearchArgs;
use crate::cli::output::Printer;
use crate::index::ZettelRepository;
use crate::sync::SyncEngine;

pub fn handle_search<R: ZettelRepository, W: Write>(
    args: &SearchArgs,
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let query = args.query();
    let notes = engine
        .search(&query)
        .with_context(|| format!("search failed for '{}'", query))?;
    printer.notes(&notes)
}

pub fn handle_history<R: ZettelRepository, W: Write>(
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    printer.notes(&engine.history()?)
}

pub fn handle_backlog<R: ZettelRepository, W: Write>(
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    printer.notes(&engine.backlog()?)
}
