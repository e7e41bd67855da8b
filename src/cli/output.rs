//! Output format types for CLI commands.

use crate::domain::Note;
use crate::sync::{BrokenLink, SyncReport};
use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain file paths, one per line (default)
    #[default]
    Paths,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
pub struct NoteListing {
    pub id: String,
    pub title: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&Note> for NoteListing {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().to_string(),
            title: note.title().to_string(),
            path: note.path().to_string_lossy().to_string(),
            kind: note.kind().to_string(),
        }
    }
}

/// Writes command results to stdout (or any writer in tests).
pub struct Printer<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn note(&mut self, note: &Note) -> Result<()> {
        match self.format {
            OutputFormat::Paths => writeln!(self.out, "{}", note.path().display())?,
            OutputFormat::Json => self.json(&NoteListing::from(note))?,
        }
        Ok(())
    }

    pub fn notes(&mut self, notes: &[Note]) -> Result<()> {
        match self.format {
            OutputFormat::Paths => {
                for note in notes {
                    writeln!(self.out, "{}", note.path().display())?;
                }
            }
            OutputFormat::Json => {
                let listings: Vec<NoteListing> = notes.iter().map(NoteListing::from).collect();
                self.json(&listings)?;
            }
        }
        Ok(())
    }

    /// Broken references: affected note paths, or one line per reference
    /// when `detailed`.
    pub fn broken_links(&mut self, links: &[BrokenLink], detailed: bool) -> Result<()> {
        match self.format {
            OutputFormat::Paths if detailed => {
                for link in links {
                    writeln!(self.out, "{}", link)?;
                }
            }
            OutputFormat::Paths => {
                let paths: BTreeSet<&PathBuf> = links.iter().map(|l| &l.path).collect();
                for path in paths {
                    writeln!(self.out, "{}", path.display())?;
                }
            }
            OutputFormat::Json => self.json(&links)?,
        }
        Ok(())
    }

    /// Sync results only have a stdout form in JSON.
    pub fn report(&mut self, report: &SyncReport) -> Result<()> {
        if self.format == OutputFormat::Json {
            self.json(report)?;
        }
        Ok(())
    }

    fn json<T: Serialize>(&mut self, data: T) -> Result<()> {
        let output = Output::new(data);
        writeln!(self.out, "{}", serde_json::to_string_pretty(&output)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NoteKind;
    use crate::sync::BrokenKind;
    use pretty_assertions::assert_eq;

    fn note(id: &str, title: &str) -> Note {
        Note::new(
            id.parse().unwrap(),
            title,
            format!("# {}\n", title),
            PathBuf::from(format!("/zet/fleet/{}.{}.md", title.to_lowercase(), id)),
            NoteKind::Fleet,
        )
        .unwrap()
    }

    fn render(format: OutputFormat, f: impl FnOnce(&mut Printer<Vec<u8>>)) -> String {
        let mut printer = Printer::new(Vec::new(), format);
        f(&mut printer);
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn paths_prints_one_path_per_line() {
        let notes = vec![note("1", "Alpha"), note("2", "Beta")];
        let out = render(OutputFormat::Paths, |p| p.notes(&notes).unwrap());
        assert_eq!(out, "/zet/fleet/alpha.1.md\n/zet/fleet/beta.2.md\n");
    }

    #[test]
    fn json_wraps_listings_in_data() {
        let notes = vec![note("1", "Alpha")];
        let out = render(OutputFormat::Json, |p| p.notes(&notes).unwrap());

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["data"][0]["id"], "1");
        assert_eq!(value["data"][0]["title"], "Alpha");
        assert_eq!(value["data"][0]["type"], "fleet");
    }

    #[test]
    fn broken_links_paths_are_deduplicated() {
        let links = vec![
            BrokenLink {
                path: PathBuf::from("/zet/fleet/a.1.md"),
                reference: "x".into(),
                line: 3,
                kind: BrokenKind::Unresolved,
            },
            BrokenLink {
                path: PathBuf::from("/zet/fleet/a.1.md"),
                reference: String::new(),
                line: 4,
                kind: BrokenKind::Empty,
            },
        ];

        let out = render(OutputFormat::Paths, |p| p.broken_links(&links, false).unwrap());
        assert_eq!(out, "/zet/fleet/a.1.md\n");

        let out = render(OutputFormat::Paths, |p| p.broken_links(&links, true).unwrap());
        assert_eq!(
            out,
            "/zet/fleet/a.1.md:3: unresolved reference [[x]]\n/zet/fleet/a.1.md:4: empty reference [[]]\n"
        );
    }

    #[test]
    fn report_is_silent_in_paths_mode() {
        let out = render(OutputFormat::Paths, |p| p.report(&SyncReport::default()).unwrap());
        assert!(out.is_empty());
    }
}
