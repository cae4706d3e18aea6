//! Error types for wltdb-store.

use std::path::PathBuf;

use wltdb_types::{DateFormatError, ParseError};

/// Result type for wltdb-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wltdb-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The database file could not be opened or initialized.
    #[error("Failed to open database {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A log stream could not be read.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A log file could not be opened or read.
    #[error("Failed to read log {path}: {source}")]
    ReadLog { path: PathBuf, source: ParseError },

    /// The report file could not be created or truncated.
    #[error("Cannot write report to {path}: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing report output failed.
    #[error("Failed to write report: {0}")]
    Write(#[source] std::io::Error),

    /// Unknown text encoding label.
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// The encoding has no byte encoder of its own (UTF-16, `replacement`).
    #[error("Reports cannot be written in {0}")]
    UnsupportedOutputEncoding(&'static str),

    /// Report bounds could not be formatted.
    #[error(transparent)]
    DateFormat(#[from] DateFormatError),
}

impl Error {
    /// Whether this error is confined to a single input file.
    ///
    /// Batch ingest records these and continues with the next file; any other
    /// error aborts the batch.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Error::ReadLog { .. } | Error::Parse(_))
    }
}
