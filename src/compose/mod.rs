//! Compositors: turn a resolved grid into one working canvas.
//!
//! All three modes share a [`Compositor`] holding the pixel source and the
//! optional labeler. The canvas stays a 16-bit [`Raster`] with the first
//! image's `maxval` until [`finish`](crate::finish::finish) picks the output
//! depth.

mod collage;
mod interleave;
mod mosaic;

use std::path::{Path, PathBuf};

use image::{Luma, LumaA, Pixel, Rgb, Rgba};

use crate::codec::TileSource;
use crate::config::LayoutMode;
use crate::error::ComposeError;
use crate::grid::ResolvedGrid;
use crate::label::{Labeler, label_for};
use crate::layout::Size;
use crate::raster::{Raster, Sample};

/// Shared state for one composition.
pub struct Compositor<'a> {
    source: &'a dyn TileSource,
    labeler: Option<Labeler<'a>>,
    transpose: bool,
}

impl<'a> Compositor<'a> {
    pub fn new(source: &'a dyn TileSource) -> Self {
        Self {
            source,
            labeler: None,
            transpose: false,
        }
    }

    /// Stamp each tile with its file name.
    pub fn labeler(mut self, labeler: Labeler<'a>) -> Self {
        self.labeler = Some(labeler);
        self
    }

    /// Vertical slices for interleave. Collage and mosaic take transposition
    /// from the manifest order instead.
    pub fn transpose(mut self, transpose: bool) -> Self {
        self.transpose = transpose;
        self
    }

    /// Build the canvas for `mode`.
    pub fn compose(
        &self,
        mode: LayoutMode,
        grid: &ResolvedGrid,
    ) -> Result<Raster<u16>, ComposeError> {
        match mode {
            LayoutMode::Collage { .. } => collage::compose(self, grid),
            LayoutMode::Mosaic { .. } => mosaic::compose(self, grid),
            LayoutMode::Interleave { slices } => interleave::compose(self, grid, slices),
        }
    }

    /// Dimensions of every path, in order.
    fn header_sizes(&self, paths: &[PathBuf]) -> Result<Vec<Size>, ComposeError> {
        paths.iter().map(|p| self.source.dimensions(p)).collect()
    }

    fn decode(&self, path: &Path) -> Result<Raster<u16>, ComposeError> {
        self.source.decode(path)
    }

    fn label<T: Sample>(&self, tile: &mut Raster<T>, path: &Path)
    where
        Luma<T>: Pixel<Subpixel = T>,
        LumaA<T>: Pixel<Subpixel = T>,
        Rgb<T>: Pixel<Subpixel = T>,
        Rgba<T>: Pixel<Subpixel = T>,
    {
        if let Some(labeler) = &self.labeler {
            labeler.stamp(tile, &label_for(path));
        }
    }
}

/// White canvas matching the first tile's channel layout and depth.
fn blank_canvas(size: Size, like: &Raster<u16>) -> Raster<u16> {
    let white = u16::try_from(like.maxval()).unwrap_or(u16::MAX);
    Raster::filled(size, like.channels(), like.maxval(), white)
}

fn ensure_channels(
    path: &Path,
    canvas: &Raster<u16>,
    tile: &Raster<u16>,
) -> Result<(), ComposeError> {
    if canvas.channels() == tile.channels() {
        Ok(())
    } else {
        Err(ComposeError::ChannelMismatch {
            path: path.to_path_buf(),
            expected: canvas.channels(),
            found: tile.channels(),
        })
    }
}

/// `DimensionMismatch` over every input, with the header size of `path`
/// replaced by the size it actually decoded to.
fn decoded_mismatch(
    grid: &ResolvedGrid,
    headers: &[Size],
    path: &Path,
    decoded: Size,
) -> ComposeError {
    let mut sizes = headers.to_vec();
    if let Some(size) = grid
        .inputs()
        .iter()
        .position(|p| p == path)
        .and_then(|i| sizes.get_mut(i))
    {
        *size = decoded;
    }
    ComposeError::dimensions(
        sizes.iter().map(|s| s.width).collect(),
        sizes.iter().map(|s| s.height).collect(),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    use crate::codec::{MemorySource, TileSource};
    use crate::error::ComposeError;
    use crate::label::{GlyphMask, GlyphRenderer};
    use crate::layout::Size;
    use crate::raster::Raster;

    /// Gray tile where every sample is `value`.
    pub fn solid(w: u32, h: u32, value: u16) -> Raster<u16> {
        Raster::filled(Size::new(w, h), 1, 255, value)
    }

    /// Source of solid tiles named `0.png`, `1.png`, ... with values 10, 20, ...
    pub fn numbered(count: usize, w: u32, h: u32) -> (MemorySource, Vec<String>) {
        let mut src = MemorySource::new();
        let mut names = Vec::new();
        for i in 0..count {
            let name = format!("{i}.png");
            src.insert(&name, solid(w, h, 10 * (i as u16 + 1)));
            names.push(name);
        }
        (src, names)
    }

    /// Opaque block covering `px` rows and `px/2` columns per character.
    pub struct Block;

    impl GlyphRenderer for Block {
        fn render(&self, text: &str, px: f32) -> GlyphMask {
            let size = Size::new(text.len() as u32 * (px as u32 / 2), px as u32);
            GlyphMask {
                size,
                coverage: vec![1.0; size.width as usize * size.height as usize],
            }
        }
    }

    /// Memory source whose header for `path` claims `header`, while the
    /// decoded pixels keep their real size.
    pub struct StaleHeader {
        pub inner: MemorySource,
        pub path: PathBuf,
        pub header: Size,
    }

    impl TileSource for StaleHeader {
        fn dimensions(&self, path: &Path) -> Result<Size, ComposeError> {
            if path == self.path {
                Ok(self.header)
            } else {
                self.inner.dimensions(path)
            }
        }

        fn decode(&self, path: &Path) -> Result<Raster<u16>, ComposeError> {
            self.inner.decode(path)
        }
    }
}
