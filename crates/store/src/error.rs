use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the file-backed log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to create log file {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to read log file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write log file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to truncate log file {}: {source}", .path.display())]
    Truncate { path: PathBuf, source: io::Error },

    #[error("log store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn open(path: &std::path::Path, source: io::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create(path: &std::path::Path, source: io::Error) -> Self {
        Self::Create {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn read(path: &std::path::Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &std::path::Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn truncate(path: &std::path::Path, source: io::Error) -> Self {
        Self::Truncate {
            path: path.to_path_buf(),
            source,
        }
    }
}
