use crate::domain::NoteError;
use crate::index::IndexError;
use crate::infra::{FsError, TemplateError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from engine operations that span the filesystem and the index.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("note is already permanent: {path}")]
    AlreadyPermanent { path: PathBuf },

    #[error("note already exists: {path}")]
    Exists { path: PathBuf },
}

impl SyncError {
    /// True when the underlying cause is a missing index row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::Index(e) if e.is_not_found())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
