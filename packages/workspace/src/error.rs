use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Invalid entry id: {0:?}")]
    InvalidEntryId(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EntryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EntryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type EntryResult<T> = Result<T, EntryError>;
