//! Error kinds for grid resolution, validation, compositing and I/O.

use std::path::PathBuf;

/// Composition error.
///
/// Every variant is fatal: the run aborts before the output file is written.
/// A label that does not fit its tile is not an error, see
/// [`LabelOutcome`](crate::label::LabelOutcome).
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// More input images than grid slots.
    #[error("{files} images supplied for a {rows}x{cols} grid ({slots} slots)")]
    CountMismatch {
        files: usize,
        rows: u32,
        cols: u32,
        slots: usize,
    },

    /// Image dimensions are incompatible with the grid shape.
    #[error("image dimensions do not match: widths {widths:?}, heights {heights:?}")]
    DimensionMismatch { widths: Vec<u32>, heights: Vec<u32> },

    /// Interleave height cannot be split into the requested number of slices.
    #[error(
        "image height {height} is not divisible by {slices}; prime factors of {height} are {factors:?}"
    )]
    IndivisibleHeight {
        height: u32,
        slices: u32,
        factors: Vec<u32>,
    },

    /// A tile has a different channel count than the canvas.
    #[error("{path}: expected {expected} channels, found {found}")]
    ChannelMismatch {
        path: PathBuf,
        expected: u8,
        found: u8,
    },

    /// No input images were given.
    #[error("no input images")]
    EmptyInput,

    /// Grid rows, columns or slice count is zero, or the grid would need a
    /// canvas larger than `u32` pixels on a side.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Downsample exponent outside `0..=3`.
    #[error("downsample exponent must be 0..=3, got {0}")]
    InvalidDownsample(u8),

    /// Label font size below the minimum.
    #[error("label font size must be at least {min}, got {size}")]
    LabelSizeTooSmall { size: u32, min: u32 },

    /// The external decoder failed.
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The external encoder failed.
    #[error("failed to write {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// No usable font for label rendering.
    #[error("cannot load label font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
}

impl ComposeError {
    /// Shorthand for [`ComposeError::DimensionMismatch`].
    pub(crate) fn dimensions(widths: Vec<u32>, heights: Vec<u32>) -> Self {
        Self::DimensionMismatch { widths, heights }
    }
}
