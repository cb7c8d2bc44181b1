//! Harness error types.

use std::fmt;

use thiserror::Error;

use crate::backends::RecordId;

/// Errors raised by a single backend while talking to its store.
#[derive(Debug, Error)]
pub enum BackendError {
    /// SQLite driver error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The row for an identifier does not exist.
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// A statement touched an unexpected number of rows.
    #[error("expected {expected} row(s) affected, got {actual}")]
    RowsAffected { expected: usize, actual: usize },

    /// A request was rejected before reaching the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// The store handed back an identifier that is not a valid record id.
    #[error("invalid record id {0}")]
    InvalidId(i64),
}

/// The workload step that was executing when a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Setup,
    Create,
    Read,
    Update,
    Delete,
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Open => "open",
            Operation::Setup => "setup",
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Close => "close",
        };
        f.write_str(name)
    }
}

/// Harness errors. Every variant is fatal for the whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// A step outside the workload cycles failed: open, setup or close.
    #[error("{backend} {operation} failed: {source}")]
    Setup {
        backend: String,
        operation: Operation,
        #[source]
        source: BackendError,
    },

    /// A workload operation failed.
    #[error("{backend} {operation} failed at item {index}: {source}")]
    Operation {
        backend: String,
        operation: Operation,
        index: usize,
        #[source]
        source: BackendError,
    },

    /// A freshly created record did not read back as written.
    #[error("{backend} read at item {index} returned {actual:?}, expected {expected:?}")]
    Mismatch {
        backend: String,
        index: usize,
        expected: (String, i64),
        actual: (String, i64),
    },

    /// An identifier produced by the store could not be interpreted.
    #[error("{backend} {operation} at item {index} produced unparseable id {raw}")]
    Parse {
        backend: String,
        operation: Operation,
        index: usize,
        raw: i64,
    },

    /// Invalid harness configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Writing the report failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a backend failure for one workload item.
    ///
    /// `InvalidId` is classified as a parse failure, everything else as an
    /// operation failure.
    pub(crate) fn at(
        backend: &str,
        operation: Operation,
        index: usize,
        source: BackendError,
    ) -> Self {
        match source {
            BackendError::InvalidId(raw) => Error::Parse {
                backend: backend.to_string(),
                operation,
                index,
                raw,
            },
            source => Error::Operation {
                backend: backend.to_string(),
                operation,
                index,
                source,
            },
        }
    }

    /// Name of the backend the error came from, if any.
    pub fn backend(&self) -> Option<&str> {
        match self {
            Error::Setup { backend, .. }
            | Error::Operation { backend, .. }
            | Error::Mismatch { backend, .. }
            | Error::Parse { backend, .. } => Some(backend),
            Error::Config(_) | Error::Io(_) => None,
        }
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
