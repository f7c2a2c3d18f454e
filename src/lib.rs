//! Grid image compositing: collage, mosaic and interleave.
//!
//! Assembles a list of source images into one raster. Grid resolution and
//! layout are pure arithmetic; pixels move only in the compositors, and files
//! are touched only through [`TileSource`] and [`Finished::save`].
//!
//! # Modules
//!
//! - [`config`]: Layout mode and run options
//! - [`grid`]: Grid shape, blank padding, natural sort, transposition
//! - [`layout`]: Dimension checks, tile placement, mosaic cells, interleave bands
//! - [`raster`]: Pixel buffers with an explicit maxval
//! - [`codec`]: Decoder/encoder boundary
//! - [`label`]: Filename labels
//! - [`compose`]: The three compositors
//! - [`finish`](mod@finish): Downsampling and output bit depth
//!
//! # Example
//!
//! ```
//! use imgrid::{LayoutMode, MemorySource, Raster, RunConfig, Size, render};
//!
//! let tile = |v: u16| Raster::filled(Size::new(100, 50), 3, 255, v);
//! let source = MemorySource::new()
//!     .with("a.png", tile(0))
//!     .with("b.png", tile(100))
//!     .with("c.png", tile(200));
//!
//! let config = RunConfig::new(LayoutMode::collage(2, 2));
//! let (out, blanks) = render(&config, &["a.png", "b.png", "c.png"], &source, None).unwrap();
//!
//! assert_eq!(out.size(), Size::new(200, 100));
//! assert_eq!(blanks, 1);
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod compose;
pub mod config;
pub mod error;
pub mod finish;
pub mod grid;
pub mod label;
pub mod layout;
pub mod raster;
mod run;

pub use codec::{FileSource, Finished, MemorySource, TileSource};
pub use compose::Compositor;
pub use config::{LayoutMode, RunConfig};
pub use error::ComposeError;
pub use finish::finish;
pub use grid::{Entry, GridShape, ResolvedGrid, natural_cmp, resolve, transpose_order};
pub use label::{FontRenderer, GlyphMask, GlyphRenderer, LabelOutcome, Labeler};
pub use layout::{
    CollageLayout, InterleaveGeometry, Rect, Size, downsampled, mosaic_cells, prime_factors,
    validate_dimensions,
};
pub use raster::{Raster, Sample};
pub use run::{RunSummary, render, run};
