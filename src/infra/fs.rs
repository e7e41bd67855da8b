//! Filesystem accessor for the fleet and permanent note areas.

use crate::domain::{NoteError, NoteKind};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use super::slug::NOTE_EXTENSION;

/// Directory name of the transient area.
pub const FLEET_DIR: &str = "fleet";
/// Directory name of the curated area.
pub const PERMANENT_DIR: &str = "permanent";
/// Directory name holding note body templates.
pub const TEMPLATES_DIR: &str = "templates";

/// Errors during file system operations on notes.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("note file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot rename {from} to {to}: target already exists")]
    AlreadyExists { from: PathBuf, to: PathBuf },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("invalid encoding in {path}: {encoding}")]
    InvalidEncoding { path: PathBuf, encoding: String },
}

impl FsError {
    /// Creates an appropriate FsError from an io::Error.
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }
}

/// The note tree on disk: a root with `fleet/` and `permanent/` areas.
///
/// Every note path handed out by the vault lies directly inside one of the
/// two area directories. Roots are canonicalized on open so that paths
/// coming from the index and from the command line compare equal.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    fleet: PathBuf,
    permanent: PathBuf,
}

impl Vault {
    /// Opens the vault at `root`, creating the root and both areas if needed.
    pub fn open(root: &Path) -> Result<Self, FsError> {
        for dir in [
            root.to_path_buf(),
            root.join(FLEET_DIR),
            root.join(PERMANENT_DIR),
        ] {
            if dir.exists() && !dir.is_dir() {
                return Err(FsError::NotADirectory { path: dir });
            }
            std::fs::create_dir_all(&dir).map_err(|e| FsError::from_io(&dir, e))?;
        }

        let root = root.canonicalize().map_err(|e| FsError::from_io(root, e))?;
        Ok(Self {
            fleet: root.join(FLEET_DIR),
            permanent: root.join(PERMANENT_DIR),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fleet_root(&self) -> &Path {
        &self.fleet
    }

    pub fn permanent_root(&self) -> &Path {
        &self.permanent
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    /// Returns the directory of an area.
    pub fn area_root(&self, kind: NoteKind) -> &Path {
        match kind {
            NoteKind::Fleet => &self.fleet,
            NoteKind::Permanent => &self.permanent,
        }
    }

    /// Derives the area a note path belongs to.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::OutsideAreas` if the file does not sit directly
    /// inside the fleet or permanent directory.
    pub fn kind_of(&self, path: &Path) -> Result<NoteKind, NoteError> {
        match path.parent() {
            Some(parent) if parent == self.fleet => Ok(NoteKind::Fleet),
            Some(parent) if parent == self.permanent => Ok(NoteKind::Permanent),
            _ => Err(NoteError::OutsideAreas { path: path.into() }),
        }
    }

    /// Turns a user supplied path into the form stored in the index.
    ///
    /// Relative paths are resolved against the current directory and existing
    /// files are canonicalized.
    pub fn normalize(&self, path: &Path) -> PathBuf {
        if let Ok(canonical) = path.canonicalize() {
            return canonical;
        }
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Checks that `path` is an existing note file inside one of the areas.
    pub fn validate(&self, path: &Path) -> Result<NoteKind, NoteError> {
        let kind = self.kind_of(path)?;
        if !path.is_file() {
            return Err(NoteError::Missing { path: path.into() });
        }
        Ok(kind)
    }

    /// Lists the note files of one area, sorted by filename.
    ///
    /// Hidden files and non-markdown files are skipped.
    pub fn list(&self, kind: NoteKind) -> Result<Vec<PathBuf>, FsError> {
        let dir = self.area_root(kind);
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("filesystem loop"));
                FsError::from_io(dir, source)
            })?;
            if entry.file_type().is_file() && !is_hidden(&entry) && has_md_extension(&entry) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    /// Lists every note file, fleet area first.
    pub fn list_all(&self) -> Result<Vec<PathBuf>, FsError> {
        let mut paths = self.list(NoteKind::Fleet)?;
        paths.extend(self.list(NoteKind::Permanent)?);
        Ok(paths)
    }

    /// Reads a note file as UTF-8 text.
    ///
    /// A leading UTF-8 byte order mark is stripped.
    pub fn read(&self, path: &Path) -> Result<String, FsError> {
        let bytes = std::fs::read(path).map_err(|e| FsError::from_io(path, e))?;

        if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
            return Err(FsError::InvalidEncoding {
                path: path.into(),
                encoding: "UTF-16 byte order mark detected; convert to UTF-8".into(),
            });
        }

        let content = String::from_utf8(bytes).map_err(|e| FsError::InvalidEncoding {
            path: path.into(),
            encoding: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        })?;

        Ok(match content.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_string(),
            None => content,
        })
    }

    /// Writes a note file atomically through a temporary file in the same directory.
    pub fn write(&self, path: &Path, content: &str) -> Result<(), FsError> {
        let parent = path.parent().ok_or_else(|| FsError::NotFound { path: path.into() })?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| FsError::from_io(parent, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| FsError::Io {
                path: path.into(),
                source: e,
            })?;
        temp.persist(path).map_err(|e| FsError::AtomicWrite {
            path: path.into(),
            source: e.error,
        })?;

        Ok(())
    }

    /// Renames a note file, refusing to overwrite an existing file.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        if to.exists() {
            return Err(FsError::AlreadyExists {
                from: from.into(),
                to: to.into(),
            });
        }
        std::fs::rename(from, to).map_err(|e| FsError::from_io(from, e))
    }

    /// Deletes a note file.
    pub fn remove(&self, path: &Path) -> Result<(), FsError> {
        std::fs::remove_file(path).map_err(|e| FsError::from_io(path, e))
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn has_md_extension(entry: &DirEntry) -> bool {
    entry.path().extension().is_some_and(|e| e == NOTE_EXTENSION)
}
