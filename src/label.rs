//! Filename labels alpha-blended onto tiles.
//!
//! Glyph rasterization sits behind [`GlyphRenderer`]; [`FontRenderer`] does it
//! with a TrueType font through `rusttype`. Blending happens in normalized
//! `0.0..=1.0` space whatever the tile's bit depth, then goes back to the
//! tile's own sample range.

use std::path::{Path, PathBuf};

use image::{Luma, LumaA, Pixel, Rgb, Rgba};
use rusttype::{Font, Scale, point};
use tracing::{debug, warn};

use crate::error::ComposeError;
use crate::layout::Size;
use crate::raster::{Raster, Sample};

/// Top-left corner of the label inside its tile.
pub const LABEL_OFFSET: (u32, u32) = (8, 8);

/// Label intensity in normalized units (white).
pub const LABEL_COLOR: f32 = 1.0;

/// Fonts tried when none is given explicitly.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Rendered text as a coverage mask, row-major, one `0.0..=1.0` value per
/// pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphMask {
    pub size: Size,
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    /// An all-zero mask.
    pub fn empty(size: Size) -> Self {
        Self {
            size,
            coverage: vec![0.0; size.width as usize * size.height as usize],
        }
    }

    pub fn at(&self, x: u32, y: u32) -> f32 {
        self.coverage[y as usize * self.size.width as usize + x as usize]
    }
}

/// Text rasterizer.
pub trait GlyphRenderer {
    /// Render `text` at a font size of `px` pixels. The mask's size is the
    /// text's bounding box.
    fn render(&self, text: &str, px: f32) -> GlyphMask;
}

/// TrueType rasterizer.
pub struct FontRenderer {
    font: Font<'static>,
    path: PathBuf,
}

impl FontRenderer {
    /// Load a `.ttf`/`.otf` file.
    pub fn from_file(path: &Path) -> Result<Self, ComposeError> {
        let bytes = std::fs::read(path).map_err(|e| ComposeError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| ComposeError::Font {
            path: path.to_path_buf(),
            reason: "not a usable TrueType font".into(),
        })?;
        debug!(path = %path.display(), "loaded label font");
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Load `explicit` if given, otherwise the first readable system font.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ComposeError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|p| p.is_file())
            .find_map(|p| Self::from_file(p).ok())
            .ok_or_else(|| ComposeError::Font {
                path: PathBuf::from(FONT_CANDIDATES[0]),
                reason: "no system font found, pass --font".into(),
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GlyphRenderer for FontRenderer {
    fn render(&self, text: &str, px: f32) -> GlyphMask {
        let scale = Scale::uniform(px);
        let v = self.font.v_metrics(scale);
        let glyphs: Vec<_> = self
            .font
            .layout(text, scale, point(0.0, v.ascent))
            .collect();

        let width = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .map(|bb| bb.max.x)
            .max()
            .unwrap_or(0)
            .max(0) as u32;
        let height = (v.ascent - v.descent).ceil().max(0.0) as u32;
        let mut mask = GlyphMask::empty(Size::new(width, height));

        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, cov| {
                let x = bb.min.x + gx as i32;
                let y = bb.min.y + gy as i32;
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    return;
                }
                let i = y as usize * width as usize + x as usize;
                mask.coverage[i] = mask.coverage[i].max(cov);
            });
        }
        mask
    }
}

/// What happened to a tile's label.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelOutcome {
    Applied,
    /// The text (plus offset) did not fit; the tile is untouched.
    Skipped { text: Size, tile: Size },
}

/// Stamps labels at a fixed font size.
pub struct Labeler<'a> {
    renderer: &'a dyn GlyphRenderer,
    size: u32,
}

impl<'a> Labeler<'a> {
    pub fn new(renderer: &'a dyn GlyphRenderer, size: u32) -> Self {
        Self { renderer, size }
    }

    /// Blend `text` onto `tile` at [`LABEL_OFFSET`]. A label that would not
    /// fit is skipped and the tile returned byte-identical.
    pub fn stamp<T: Sample>(&self, tile: &mut Raster<T>, text: &str) -> LabelOutcome
    where
        Luma<T>: Pixel<Subpixel = T>,
        LumaA<T>: Pixel<Subpixel = T>,
        Rgb<T>: Pixel<Subpixel = T>,
        Rgba<T>: Pixel<Subpixel = T>,
    {
        let mask = self.renderer.render(text, self.size as f32);
        let (ox, oy) = LABEL_OFFSET;
        if ox + mask.size.width > tile.width() || oy + mask.size.height > tile.height() {
            warn!(
                label = text,
                text_w = mask.size.width,
                text_h = mask.size.height,
                tile_w = tile.width(),
                tile_h = tile.height(),
                "label does not fit, skipped"
            );
            return LabelOutcome::Skipped {
                text: mask.size,
                tile: tile.size(),
            };
        }
        blend(tile, &mask, ox, oy, LABEL_COLOR);
        LabelOutcome::Applied
    }
}

/// `out = tile·(1−α) + color·α` per channel, in normalized space.
fn blend<T: Sample>(tile: &mut Raster<T>, mask: &GlyphMask, ox: u32, oy: u32, color: f32)
where
    Luma<T>: Pixel<Subpixel = T>,
    LumaA<T>: Pixel<Subpixel = T>,
    Rgb<T>: Pixel<Subpixel = T>,
    Rgba<T>: Pixel<Subpixel = T>,
{
    let maxval = tile.maxval();
    for y in 0..mask.size.height {
        for x in 0..mask.size.width {
            let alpha = mask.at(x, y);
            if alpha <= 0.0 {
                continue;
            }
            for s in tile.pixel_mut(ox + x, oy + y) {
                let v = s.to_unit(maxval) * (1.0 - alpha) + color * alpha;
                *s = T::from_unit(v, maxval);
            }
        }
    }
}

/// Label text for an input: the file name without extension.
pub fn label_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
