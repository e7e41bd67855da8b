//! Isolated notes root inside a temp directory.

#![allow(dead_code)]

use super::{TestNote, ZetCommand};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zet::domain::NoteKind;

/// Isolated test environment with a temporary notes root.
///
/// The root is canonicalized so printed paths compare equal.
pub struct TestEnv {
    _temp_dir: TempDir,
    root: PathBuf,
    config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory");
        let root = base.join("notes");
        for area in ["fleet", "permanent"] {
            fs::create_dir_all(root.join(area)).expect("Failed to create note area");
        }
        Self {
            _temp_dir: temp_dir,
            root,
            config: base.join("config.toml"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn area(&self, kind: NoteKind) -> PathBuf {
        match kind {
            NoteKind::Fleet => self.root.join("fleet"),
            NoteKind::Permanent => self.root.join("permanent"),
        }
    }

    /// Where the index lives without `--database`.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(".index").join("zettel.db")
    }

    /// Writes the config file every command of this environment reads.
    pub fn write_config(&self, contents: &str) {
        fs::write(&self.config, contents).expect("Failed to write config");
    }

    /// Writes the note into an area and returns its path.
    pub fn add_note(&self, kind: NoteKind, note: &TestNote) -> PathBuf {
        self.write_file(kind, &note.filename(), &note.content())
    }

    pub fn write_file(&self, kind: NoteKind, name: &str, content: &str) -> PathBuf {
        let path = self.area(kind).join(name);
        fs::write(&path, content).expect("Failed to write note file");
        path
    }

    pub fn write_template(&self, contents: &str) {
        let dir = self.root.join("templates");
        fs::create_dir_all(&dir).expect("Failed to create templates dir");
        fs::write(dir.join("zet.tmpl.md"), contents).expect("Failed to write template");
    }

    /// A command bound to this root and config.
    pub fn cmd(&self) -> ZetCommand {
        ZetCommand::new(&self.config).root(&self.root)
    }

    /// A command with only the config file; the root comes from elsewhere.
    pub fn bare_cmd(&self) -> ZetCommand {
        ZetCommand::new(&self.config)
    }

    /// Every note file currently in an area, sorted by name.
    pub fn files(&self, kind: NoteKind) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.area(kind))
            .expect("Failed to read area")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
