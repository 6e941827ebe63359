//! Ingestion error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that abort a load. No partial volume is ever produced.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Source directory does not exist.
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// No file in the directory matched the extension filter.
    #[error("no '{extension}' frames found in {}", .dir.display())]
    NoFrames { dir: PathBuf, extension: String },

    /// File is smaller than one frame payload, so the header length would be negative.
    #[error(
        "malformed frame {}: {file_size} bytes is smaller than the {payload_len}-byte payload",
        .path.display()
    )]
    MalformedFrame {
        path: PathBuf,
        file_size: usize,
        payload_len: usize,
    },

    /// Image frame dimensions differ from the first frame.
    #[error(
        "frame {} is {}x{}, expected {}x{}",
        .path.display(),
        .found.0,
        .found.1,
        .expected.0,
        .expected.1
    )]
    ShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Decoded image buffer does not hold one sample per pixel.
    #[error(
        "decoded {} holds {found} samples, expected {expected} for {}x{}",
        .path.display(),
        .dim.0,
        .dim.1
    )]
    SampleCount {
        path: PathBuf,
        dim: (usize, usize),
        expected: usize,
        found: usize,
    },

    /// Raw bit depth other than 8 or 16.
    #[error("unsupported bit depth: {0} (expected 8 or 16)")]
    UnsupportedBitDepth(u8),

    /// Raw frame height or width is zero.
    #[error("invalid frame dimensions {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },

    /// File could not be opened, mapped or listed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoder rejected the file.
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Volume assembly failed.
    #[error("core error: {0}")]
    Core(#[from] leemstack_core::Error),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
