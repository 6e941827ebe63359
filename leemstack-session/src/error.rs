//! Error types for leemstack-session.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the session boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Analysis error from the core crate.
    #[error(transparent)]
    Core(#[from] leemstack_core::Error),

    /// Ingestion error.
    #[error(transparent)]
    Ingest(#[from] leemstack_io::IngestError),

    /// A previous export batch is still writing.
    #[error("previous export still running ({running} file(s) pending)")]
    ExportBusy { running: usize },

    /// Export requested with no selections.
    #[error("no {what} selections to export")]
    NothingToExport { what: &'static str },

    /// Writing an export file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<leemstack_core::SmoothError> for Error {
    fn from(err: leemstack_core::SmoothError) -> Self {
        Self::Core(err.into())
    }
}

impl From<leemstack_core::AggregationError> for Error {
    fn from(err: leemstack_core::AggregationError) -> Self {
        Self::Core(err.into())
    }
}
