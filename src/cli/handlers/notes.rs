//! Single-note commands: new, open, save, remove, promote, last.

use anyhow::{Context, Result};
use std::io::Write;

use super::EditorLauncher;
use crate::cli::output::Printer;
use crate::cli::{NewArgs, PathArgs};
use crate::index::ZettelRepository;
use crate::sync::SyncEngine;

pub fn handle_new<R: ZettelRepository, W: Write>(
    args: &NewArgs,
    engine: &mut SyncEngine<R>,
    printer: &mut Printer<W>,
    editor: &dyn EditorLauncher,
) -> Result<()> {
    let title = args.title();
    let mut note = engine
        .create(&title)
        .with_context(|| format!("failed to create note '{}'", title))?;

    if args.edit {
        editor.open(note.path())?;
        note = engine
            .save(note.path())
            .with_context(|| format!("failed to save {}", note.path().display()))?;
    }

    printer.note(&note)
}

/// Opens the note, then saves it so title edits repair the filename.
pub fn handle_open<R: ZettelRepository, W: Write>(
    args: &PathArgs,
    engine: &mut SyncEngine<R>,
    printer: &mut Printer<W>,
    editor: &dyn EditorLauncher,
) -> Result<()> {
    let note = engine
        .open(&args.path)
        .with_context(|| format!("failed to open {}", args.path.display()))?;

    editor.open(note.path())?;

    let note = engine
        .save(note.path())
        .with_context(|| format!("failed to save {}", note.path().display()))?;
    printer.note(&note)
}

pub fn handle_save<R: ZettelRepository, W: Write>(
    args: &PathArgs,
    engine: &mut SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let note = engine
        .save(&args.path)
        .with_context(|| format!("failed to save {}", args.path.display()))?;
    printer.note(&note)
}

pub fn handle_remove<R: ZettelRepository, W: Write>(
    args: &PathArgs,
    engine: &mut SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let note = engine
        .remove(&args.path)
        .with_context(|| format!("failed to remove {}", args.path.display()))?;
    printer.note(&note)
}

pub fn handle_promote<R: ZettelRepository, W: Write>(
    args: &PathArgs,
    engine: &mut SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let note = engine
        .promote(&args.path)
        .with_context(|| format!("failed to promote {}", args.path.display()))?;
    printer.note(&note)
}

pub fn handle_last<R: ZettelRepository, W: Write>(
    engine: &SyncEngine<R>,
    printer: &mut Printer<W>,
) -> Result<()> {
    let note = engine.last().context("no note has been opened yet")?;
    printer.note(&note)
}
