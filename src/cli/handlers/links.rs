//! Link commands: links, backlinks, brokenlinks.

use anyhow::{Context, Result};
use std::io::Write;

use crate::cli::output::Printer;
use crate::cli::{BrokenLinksArgs, PathArgs};
use crate::index::ZettelRepository;
use crate::sync::SyncEngine;

pub fn handle_links<R: ZettelRepository, W: Write>(
    args: &PathArgs,
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let notes = engine
        .links(&args.path)
        .with_context(|| format!("failed to list links of {}", args.path.display()))?;
    printer.notes(&notes)
}

pub fn handle_backlinks<R: ZettelRepository, W: Write>(
    args: &PathArgs,
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let notes = engine
        .backlinks(&args.path)
        .with_context(|| format!("failed to list backlinks of {}", args.path.display()))?;
    printer.notes(&notes)
}

pub fn handle_broken_links<R: ZettelRepository, W: Write>(
    args: &BrokenLinksArgs,
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let links = match &args.path {
        Some(path) => engine
            .broken_links_of(path)
            .with_context(|| format!("broken link scan failed for {}", path.display()))?,
        None => engine.broken_links().context("broken link scan failed")?,
    };
    printer.broken_links(&links, args.lines)
}
