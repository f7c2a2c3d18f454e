//! Grid geometry: dimension checks, tile placement, crop cells and bands.
//!
//! Pure arithmetic on sizes and rectangles, no pixel access. The compositors
//! ask this module where things go, then move pixels accordingly.
//!
//! # Example
//!
//! ```
//! use imgrid::{CollageLayout, GridShape, Rect, Size};
//!
//! // Four 100×50 tiles in a 2×2 grid.
//! let layout = CollageLayout::compute(GridShape::new(2, 2), &[Size::new(100, 50); 4]);
//!
//! assert_eq!(layout.canvas, Size::new(200, 100));
//! assert_eq!(layout.cells[3], Rect::new(100, 50, 100, 50));
//! ```

use crate::error::ComposeError;
use crate::grid::GridShape;

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width and height swapped.
    pub const fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rect.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rect covering a whole image of `size`.
    pub const fn full(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// One past the last column.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row.
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Clamp this rect to fit within `(0, 0, max_w, max_h)`. May become empty.
    pub fn clamp_to(self, max_w: u32, max_h: u32) -> Self {
        let x = self.x.min(max_w);
        let y = self.y.min(max_h);
        Self {
            x,
            y,
            width: self.width.min(max_w - x),
            height: self.height.min(max_h - y),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ============================================================================
// Dimension validation
// ============================================================================

/// Check that the real images fit the grid shape.
///
/// All sizes must be identical, except that a single-column grid only needs
/// matching widths and a single-row grid only needs matching heights.
/// The error lists every width and height so the user can spot the outlier.
pub fn validate_dimensions(sizes: &[Size], shape: GridShape) -> Result<(), ComposeError> {
    let Some(first) = sizes.first() else {
        return Ok(());
    };
    let same_w = sizes.iter().all(|s| s.width == first.width);
    let same_h = sizes.iter().all(|s| s.height == first.height);

    let ok = if shape.cols == 1 && shape.rows == 1 {
        true
    } else if shape.cols == 1 {
        same_w
    } else if shape.rows == 1 {
        same_h
    } else {
        same_w && same_h
    };

    if ok {
        Ok(())
    } else {
        Err(ComposeError::dimensions(
            sizes.iter().map(|s| s.width).collect(),
            sizes.iter().map(|s| s.height).collect(),
        ))
    }
}

// ============================================================================
// Collage
// ============================================================================

/// Placement of every slot in a collage.
///
/// Column offsets are running sums of the row-0 tile widths; row offsets are
/// running sums of the column-0 tile heights. Each slot keeps its own
/// footprint at `(col offset, row offset)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollageLayout {
    /// Final canvas dimensions.
    pub canvas: Size,
    /// One rect per slot, row-major.
    pub cells: Vec<Rect>,
}

impl CollageLayout {
    /// Lay out `footprints` (one per slot, row-major, blanks already resolved
    /// to a stand-in size) on a grid of `shape`.
    ///
    /// # Panics
    ///
    /// If `footprints.len() != shape.slots()`.
    pub fn compute(shape: GridShape, footprints: &[Size]) -> Self {
        assert_eq!(
            footprints.len(),
            shape.slots(),
            "one footprint per slot required"
        );
        let (rows, cols) = (shape.rows as usize, shape.cols as usize);

        let x_offsets = running_sums((0..cols).map(|c| footprints[c].width));
        let y_offsets = running_sums((0..rows).map(|r| footprints[r * cols].height));

        let canvas = Size::new(x_offsets[cols], y_offsets[rows]);
        let cells = footprints
            .iter()
            .enumerate()
            .map(|(slot, fp)| {
                let (r, c) = (slot / cols, slot % cols);
                Rect::new(x_offsets[c], y_offsets[r], fp.width, fp.height)
            })
            .collect();

        Self { canvas, cells }
    }
}

/// `[0, a, a+b, a+b+c, ...]`, one longer than the input.
fn running_sums(values: impl Iterator<Item = u32>) -> Vec<u32> {
    let mut out = vec![0];
    let mut acc = 0u32;
    for v in values {
        acc += v;
        out.push(acc);
    }
    out
}

// ============================================================================
// Mosaic
// ============================================================================

/// Nominal cell size: the image split into `rows × cols` segments,
/// remainders dropped.
pub fn mosaic_cell_size(image: Size, shape: GridShape) -> Size {
    Size::new(image.width / shape.cols, image.height / shape.rows)
}

/// Write region for every mosaic slot, row-major.
///
/// Each region starts at the cell's top-left corner `(col·cw, row·ch)` and
/// runs to the bottom-right corner of the image, not to the end of the cell.
/// Later slots overwrite the overlap, so in row-major order each cell ends up
/// showing its own source.
pub fn mosaic_cells(image: Size, shape: GridShape) -> Vec<Rect> {
    let cell = mosaic_cell_size(image, shape);
    (0..shape.slots())
        .map(|slot| {
            let (r, c) = shape.cell(slot);
            let x = c * cell.width;
            let y = r * cell.height;
            Rect::new(x, y, image.width - x, image.height - y)
        })
        .collect()
}

// ============================================================================
// Interleave
// ============================================================================

/// Band layout for interleaving `slices` bands out of images of one size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterleaveGeometry {
    /// Working size after pixel repetition.
    pub size: Size,
    /// Pixel repetition factor applied to every source on both axes.
    pub repeat: u32,
    /// Number of bands.
    pub slices: u32,
    /// Height of one band.
    pub band_height: u32,
}

impl InterleaveGeometry {
    /// Compute band geometry for sources of `source` size (already transposed
    /// if vertical slices are wanted).
    ///
    /// When `slices` exceeds the height, every pixel is repeated by the
    /// smallest factor that makes the height a multiple of `slices`.
    /// Otherwise the height must already divide evenly.
    pub fn compute(source: Size, slices: u32) -> Result<Self, ComposeError> {
        if slices == 0 {
            return Err(ComposeError::InvalidGrid(format!("{slices} slices, need at least 1")));
        }
        if source.height == 0 {
            return Err(ComposeError::InvalidGrid("image has no rows to slice".into()));
        }
        let repeat = if slices > source.height {
            slices / gcd(source.height, slices)
        } else {
            1
        };
        let (Some(width), Some(height)) = (
            source.width.checked_mul(repeat),
            source.height.checked_mul(repeat),
        ) else {
            return Err(ComposeError::InvalidGrid(format!(
                "{slices} slices of a {}x{} image overflow the canvas",
                source.width, source.height
            )));
        };
        let size = Size::new(width, height);
        if size.height % slices != 0 {
            return Err(ComposeError::IndivisibleHeight {
                height: size.height,
                slices,
                factors: prime_factors(size.height),
            });
        }
        Ok(Self {
            size,
            repeat,
            slices,
            band_height: size.height / slices,
        })
    }

    /// Rows covered by band `index`.
    pub fn band(&self, index: u32) -> Rect {
        Rect::new(
            0,
            index * self.band_height,
            self.size.width,
            self.band_height,
        )
    }

    /// Bands taken from source `source` when `stride` sources share the
    /// canvas: `source, source + stride, source + 2·stride, ...`.
    pub fn bands_of(&self, source: u32, stride: u32) -> impl Iterator<Item = u32> + use<> {
        (source..self.slices).step_by(stride.max(1) as usize)
    }
}

// ============================================================================
// Output
// ============================================================================

/// Size after dividing both axes by `2^exponent`, never below 1.
pub fn downsampled(size: Size, exponent: u8) -> Size {
    Size::new(
        (size.width >> exponent).max(1),
        (size.height >> exponent).max(1),
    )
}

/// Prime factors of `n` in ascending order, with multiplicity.
/// Empty for 0 and 1.
pub fn prime_factors(mut n: u32) -> Vec<u32> {
    let mut out = Vec::new();
    if n < 2 {
        return out;
    }
    let mut p = 2u32;
    while (p as u64) * (p as u64) <= n as u64 {
        while n % p == 0 {
            out.push(p);
            n /= p;
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        out.push(n);
    }
    out
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
