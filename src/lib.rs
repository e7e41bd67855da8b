//! zet - a zettelkasten of plain markdown files with a SQLite index

pub mod cli;
pub mod domain;
pub mod index;
pub mod infra;
pub mod sync;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::io;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        SystemEditor, handle_backlinks, handle_backlog, handle_broken_links, handle_completions,
        handle_history, handle_last, handle_links, handle_new, handle_open, handle_promote,
        handle_remove, handle_save, handle_search, handle_sync,
    },
    output::Printer,
};
use index::SqliteIndex;
use infra::Vault;
use sync::SyncEngine;

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        return handle_completions(args, &mut io::stdout().lock());
    }

    let config = Config::load()?;
    let root = config.root(cli.root.as_deref());
    let vault = Vault::open(&root)
        .with_context(|| format!("failed to open notes root {}", root.display()))?;
    let database = config.database(cli.database.as_deref(), vault.root());
    let index = SqliteIndex::open(&database, vault.clone())
        .with_context(|| format!("failed to open index {}", database.display()))?;

    let mut engine = SyncEngine::new(index, vault);
    let mut printer = Printer::new(io::stdout().lock(), cli.format);
    let editor = SystemEditor::new(config.editor());

    match &cli.command {
        Command::New(args) => handle_new(args, &mut engine, &mut printer, &editor),
        Command::Open(args) => handle_open(args, &mut engine, &mut printer, &editor),
        Command::Search(args) => handle_search(args, &engine, &mut printer),
        Command::Remove(args) => handle_remove(args, &mut engine, &mut printer),
        Command::History => handle_history(&engine, &mut printer),
        Command::Backlog => handle_backlog(&engine, &mut printer),
        Command::Links(args) => handle_links(args, &engine, &mut printer),
        Command::Backlinks(args) => handle_backlinks(args, &engine, &mut printer),
        Command::BrokenLinks(args) => handle_broken_links(args, &engine, &mut printer),
        Command::Last => handle_last(&engine, &mut printer),
        Command::Save(args) => handle_save(args, &mut engine, &mut printer),
        Command::Sync => handle_sync(&mut engine, &mut printer, cli.verbose > 0),
        Command::Promote(args) => handle_promote(args, &mut engine, &mut printer),
        Command::Completions(args) => handle_completions(args, &mut io::stdout().lock()),
    }
}

/// Logs go to stderr. `-v` raises the level step by step and `RUST_LOG`
/// overrides it.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
