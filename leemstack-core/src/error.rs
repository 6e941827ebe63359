//! Error types for leemstack-core.

use thiserror::Error;

/// Result type alias for leemstack-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while smoothing a 1D spectrum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmoothError {
    /// Window name not one of flat, hanning, hamming, bartlett, blackman.
    #[error("invalid window type '{0}' (expected flat, hanning, hamming, bartlett or blackman)")]
    InvalidWindowType(String),

    /// Window length (after rounding up to even) is 3 or less.
    #[error("window length {0} is too small; select a length greater than 3")]
    WindowTooSmall(usize),

    /// Sequence is shorter than the window, so it cannot be reflect-padded.
    #[error("sequence of length {len} is shorter than window length {window_len}")]
    SequenceTooShort { len: usize, window_len: usize },
}

/// Errors raised while box-integrating a region.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// Integration box would extend past the volume edge.
    #[error(
        "integration window of half-width {half_width} at ({row}, {col}) exceeds volume bounds {height}x{width}"
    )]
    WindowOutOfBounds {
        row: usize,
        col: usize,
        half_width: usize,
        height: usize,
        width: usize,
    },
}

/// Errors raised by the display range mapper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Lower/upper bounds are outside the sample domain or not ordered.
    #[error("invalid display range: lower={lower}, upper={upper}")]
    InvalidRange { lower: u32, upper: u32 },
}

/// Core error types for leemstack operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Smoothing failed.
    #[error(transparent)]
    Smooth(#[from] SmoothError),

    /// Box integration failed.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Display mapping failed.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// The store holds no stack yet.
    #[error("no image stack has been loaded")]
    NoData,

    /// Pixel coordinate outside the volume.
    #[error("pixel ({row}, {col}) is outside the {height}x{width} volume")]
    PixelOutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    /// Depth slice index outside the volume.
    #[error("frame index {index} is out of range for {depth} frames")]
    FrameOutOfRange { index: usize, depth: usize },

    /// Volume depth and energy axis length disagree.
    #[error("volume depth {depth} does not match energy axis length {axis_len}")]
    AxisMismatch { depth: usize, axis_len: usize },

    /// Frame list could not be stacked into a volume.
    #[error("cannot build volume: {0}")]
    InvalidVolume(String),
}
