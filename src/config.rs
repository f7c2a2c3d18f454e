//! Run configuration: layout mode and output options.
//!
//! Built once by the caller with a consuming builder, validated, then passed by
//! reference to every stage. Nothing here mutates after construction.
//!
//! # Example
//!
//! ```
//! use imgrid::{LayoutMode, RunConfig};
//!
//! let config = RunConfig::new(LayoutMode::Collage { rows: 2, cols: 3 })
//!     .transpose(true)
//!     .downsample(1)
//!     .labels(24);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.out.to_str(), Some("collage.png"));
//! ```

use std::path::PathBuf;

use crate::error::ComposeError;

/// Smallest font size accepted for labels.
pub const MIN_LABEL_SIZE: u32 = 10;

/// Largest downsample exponent (output divided by 2^3).
pub const MAX_DOWNSAMPLE: u8 = 3;

/// How the grid is assembled. Each mode carries only the shape it needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// Full images tiled edge to edge.
    Collage { rows: u32, cols: u32 },
    /// One image-sized composite, each cell cropped from its own source.
    Mosaic { rows: u32, cols: u32 },
    /// `slices` horizontal bands, taken from the sources in turn.
    Interleave { slices: u32 },
}

impl LayoutMode {
    /// Collage from the command-line `W H` order (columns first).
    pub fn collage(width: u32, height: u32) -> Self {
        Self::Collage {
            rows: height,
            cols: width,
        }
    }

    /// Mosaic from the command-line `W H` order (columns first).
    pub fn mosaic(width: u32, height: u32) -> Self {
        Self::Mosaic {
            rows: height,
            cols: width,
        }
    }

    /// Output file name used when none is given.
    pub fn default_output(self) -> &'static str {
        match self {
            Self::Collage { .. } => "collage.png",
            Self::Mosaic { .. } => "mosaic.png",
            Self::Interleave { .. } => "interleaved.png",
        }
    }

    /// Short name for log output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Collage { .. } => "collage",
            Self::Mosaic { .. } => "mosaic",
            Self::Interleave { .. } => "interleave",
        }
    }
}

/// Immutable options for one composition run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: LayoutMode,
    /// Column-major placement (collage, mosaic) or vertical slices (interleave).
    pub transpose: bool,
    /// Natural-order sort of the input paths before placement.
    pub sort: bool,
    /// Output is divided by `2^downsample` on both axes.
    pub downsample: u8,
    /// Label font size in pixels. `None` disables labels.
    pub label_size: Option<u32>,
    /// Requantize to 0..=255 before encoding.
    pub force_8bit: bool,
    pub out: PathBuf,
}

impl RunConfig {
    /// Defaults: sorted input, no transpose, no downsample, no labels,
    /// output named after the mode.
    pub fn new(mode: LayoutMode) -> Self {
        Self {
            mode,
            transpose: false,
            sort: true,
            downsample: 0,
            label_size: None,
            force_8bit: false,
            out: PathBuf::from(mode.default_output()),
        }
    }

    pub fn transpose(mut self, transpose: bool) -> Self {
        self.transpose = transpose;
        self
    }

    /// Keep the input order as given instead of sorting.
    pub fn unsorted(mut self, unsorted: bool) -> Self {
        self.sort = !unsorted;
        self
    }

    pub fn downsample(mut self, exponent: u8) -> Self {
        self.downsample = exponent;
        self
    }

    /// Enable filename labels at the given font size.
    pub fn labels(mut self, size: u32) -> Self {
        self.label_size = Some(size);
        self
    }

    pub fn force_8bit(mut self, force: bool) -> Self {
        self.force_8bit = force;
        self
    }

    pub fn out(mut self, path: impl Into<PathBuf>) -> Self {
        self.out = path.into();
        self
    }

    /// Check option ranges. Does not look at any input file.
    pub fn validate(&self) -> Result<(), ComposeError> {
        match self.mode {
            LayoutMode::Collage { rows, cols } | LayoutMode::Mosaic { rows, cols } => {
                if rows == 0 || cols == 0 {
                    return Err(ComposeError::InvalidGrid(format!("{cols}x{rows}, both must be at least 1")));
                }
            }
            LayoutMode::Interleave { slices } => {
                if slices == 0 {
                    return Err(ComposeError::InvalidGrid(format!("{slices} slices, need at least 1")));
                }
            }
        }
        if self.downsample > MAX_DOWNSAMPLE {
            return Err(ComposeError::InvalidDownsample(self.downsample));
        }
        if let Some(size) = self.label_size
            && size < MIN_LABEL_SIZE
        {
            return Err(ComposeError::LabelSizeTooSmall {
                size,
                min: MIN_LABEL_SIZE,
            });
        }
        Ok(())
    }
}
