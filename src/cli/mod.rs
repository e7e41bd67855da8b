//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// zet - a zettelkasten of plain markdown files with a SQLite index
#[derive(Parser, Debug)]
#[command(name = "zet", version, about, long_about = None)]
pub struct Cli {
    /// Notes root holding fleet/ and permanent/ (overrides ZET_ROOT and config)
    #[arg(short = 'r', long, global = true)]
    pub root: Option<PathBuf>,

    /// Index database file (default: <root>/.index/zettel.db)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Paths)]
    pub format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new fleet note
    #[command(visible_alias = "n")]
    New(NewArgs),

    /// Open a note in your editor and save it afterwards
    Open(PathArgs),

    /// Full-text search over titles and content
    Search(SearchArgs),

    /// Delete a note file and its index entry
    #[command(visible_alias = "rm")]
    Remove(PathArgs),

    /// Recently opened notes, most recent first
    History,

    /// Fleet notes, most recently updated first
    Backlog,

    /// Notes the given note links to
    Links(PathArgs),

    /// Notes linking to the given note
    Backlinks(PathArgs),

    /// Notes with references that resolve to nothing (or to a deleted file)
    #[command(name = "brokenlinks")]
    BrokenLinks(BrokenLinksArgs),

    /// The most recently opened note
    Last,

    /// Index one note after editing it (repairs its filename)
    Save(PathArgs),

    /// Rebuild the index from the note files
    Sync,

    /// Move a fleet note into the permanent area
    Promote(PathArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Note title (multiple words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,

    /// Open in editor after creation
    #[arg(short, long)]
    pub edit: bool,
}

impl NewArgs {
    pub fn title(&self) -> String {
        self.title.join(" ")
    }
}

/// Arguments for commands that take a single note path
#[derive(Parser, Debug)]
pub struct PathArgs {
    /// Path to the note file
    pub path: PathBuf,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query (FTS5 syntax)
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl SearchArgs {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }
}

/// Arguments for the `brokenlinks` command
#[derive(Parser, Debug)]
pub struct BrokenLinksArgs {
    /// Only check this note (default: every indexed note)
    pub path: Option<PathBuf>,

    /// Print one `path:line: kind [[reference]]` entry per broken reference
    #[arg(short, long)]
    pub lines: bool,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn new_joins_title_words() {
        let cli = Cli::parse_from(["zet", "new", "Rust", "Ownership"]);
        match cli.command {
            Command::New(args) => assert_eq!(args.title(), "Rust Ownership"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["zet", "history", "--root", "/tmp/notes", "-f", "json", "-vv"]);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/notes")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn default_format_is_paths() {
        let cli = Cli::parse_from(["zet", "backlog"]);
        assert_eq!(cli.format, OutputFormat::Paths);
    }

    #[test]
    fn new_requires_title() {
        assert!(Cli::try_parse_from(["zet", "new"]).is_err());
    }

    #[test]
    fn brokenlinks_command_name() {
        let cli = Cli::parse_from(["zet", "brokenlinks", "--lines"]);
        assert!(matches!(
            cli.command,
            Command::BrokenLinks(BrokenLinksArgs {
                path: None,
                lines: true
            })
        ));
    }

    #[test]
    fn brokenlinks_takes_optional_path() {
        let cli = Cli::parse_from(["zet", "brokenlinks", "fleet/a.1.md"]);
        match cli.command {
            Command::BrokenLinks(args) => {
                assert_eq!(args.path, Some(PathBuf::from("fleet/a.1.md")));
                assert!(!args.lines);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
