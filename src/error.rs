use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every way a conversion run can fail. None of these are recovered from.
#[derive(Debug, Error)]
pub enum VcgError {
    #[error("input file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{} contains no data rows", path.display())]
    EmptyTable { path: PathBuf },

    #[error("{} has {found} columns, expected {expected}", path.display())]
    ColumnMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VcgError {
    /// Classify a failed `File::open`.
    pub fn opening(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => VcgError::MissingFile {
                path: path.to_path_buf(),
            },
            _ => VcgError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, VcgError>;
