//! Boundary to the external image decoder and encoder.
//!
//! Compositors only see [`TileSource`]: header reads for dimensions and
//! full decodes into a 16-bit working [`Raster`]. [`FileSource`] backs it with
//! the `image` crate; [`MemorySource`] serves pre-decoded rasters.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use tracing::{debug, warn};

use crate::error::ComposeError;
use crate::layout::Size;
use crate::raster::{Pixels, Raster};

/// Where compositors get their pixels from.
pub trait TileSource {
    /// Image dimensions, ideally from the header alone.
    fn dimensions(&self, path: &Path) -> Result<Size, ComposeError>;

    /// Full decode. 8-bit sources come back with `maxval` 255.
    fn decode(&self, path: &Path) -> Result<Raster<u16>, ComposeError>;
}

/// Reads images from disk, format sniffed from content.
#[derive(Copy, Clone, Debug, Default)]
pub struct FileSource;

impl TileSource for FileSource {
    fn dimensions(&self, path: &Path) -> Result<Size, ComposeError> {
        image::image_dimensions(path)
            .map(|(w, h)| Size::new(w, h))
            .map_err(|source| ComposeError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }

    fn decode(&self, path: &Path) -> Result<Raster<u16>, ComposeError> {
        let decode_err = |source| ComposeError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let img = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(ImageError::IoError)
            .and_then(|r| r.decode())
            .map_err(decode_err)?;
        debug!(path = %path.display(), color = ?img.color(), "decoded");
        Ok(raster_from_dynamic(img))
    }
}

/// Pre-decoded rasters keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    images: HashMap<PathBuf, Raster<u16>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, raster: Raster<u16>) {
        self.images.insert(path.into(), raster);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<PathBuf>, raster: Raster<u16>) -> Self {
        self.insert(path, raster);
        self
    }

    fn get(&self, path: &Path) -> Result<&Raster<u16>, ComposeError> {
        self.images.get(path).ok_or_else(|| ComposeError::Decode {
            path: path.to_path_buf(),
            source: ImageError::IoError(std::io::ErrorKind::NotFound.into()),
        })
    }
}

impl TileSource for MemorySource {
    fn dimensions(&self, path: &Path) -> Result<Size, ComposeError> {
        self.get(path).map(Raster::size)
    }

    fn decode(&self, path: &Path) -> Result<Raster<u16>, ComposeError> {
        self.get(path).cloned()
    }
}

/// Convert a decoded image into a 16-bit working raster, keeping its bit
/// depth as `maxval`. Float images are converted to 16-bit RGBA.
pub fn raster_from_dynamic(img: DynamicImage) -> Raster<u16> {
    let widen =
        |pixels: Pixels<u8>| -> Raster<u16> { Raster::from_pixels(pixels, 255).requantize(255) };
    match img {
        DynamicImage::ImageLuma8(b) => widen(Pixels::Gray(b)),
        DynamicImage::ImageLumaA8(b) => widen(Pixels::GrayAlpha(b)),
        DynamicImage::ImageRgb8(b) => widen(Pixels::Rgb(b)),
        DynamicImage::ImageRgba8(b) => widen(Pixels::Rgba(b)),
        DynamicImage::ImageLuma16(b) => Raster::from_pixels(Pixels::Gray(b), 65535),
        DynamicImage::ImageLumaA16(b) => Raster::from_pixels(Pixels::GrayAlpha(b), 65535),
        DynamicImage::ImageRgb16(b) => Raster::from_pixels(Pixels::Rgb(b), 65535),
        DynamicImage::ImageRgba16(b) => Raster::from_pixels(Pixels::Rgba(b), 65535),
        other => Raster::from_pixels(Pixels::Rgba(other.into_rgba16()), 65535),
    }
}

impl From<Raster<u8>> for DynamicImage {
    fn from(raster: Raster<u8>) -> Self {
        match raster.into_pixels() {
            Pixels::Gray(b) => Self::ImageLuma8(b),
            Pixels::GrayAlpha(b) => Self::ImageLumaA8(b),
            Pixels::Rgb(b) => Self::ImageRgb8(b),
            Pixels::Rgba(b) => Self::ImageRgba8(b),
        }
    }
}

impl From<Raster<u16>> for DynamicImage {
    fn from(raster: Raster<u16>) -> Self {
        match raster.into_pixels() {
            Pixels::Gray(b) => Self::ImageLuma16(b),
            Pixels::GrayAlpha(b) => Self::ImageLumaA16(b),
            Pixels::Rgb(b) => Self::ImageRgb16(b),
            Pixels::Rgba(b) => Self::ImageRgba16(b),
        }
    }
}

/// Composite ready for the encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Finished {
    Eight(Raster<u8>),
    Sixteen(Raster<u16>),
}

impl Finished {
    pub fn size(&self) -> Size {
        match self {
            Self::Eight(r) => r.size(),
            Self::Sixteen(r) => r.size(),
        }
    }

    pub fn maxval(&self) -> u32 {
        match self {
            Self::Eight(r) => r.maxval(),
            Self::Sixteen(r) => r.maxval(),
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            Self::Eight(r) => r.channels(),
            Self::Sixteen(r) => r.channels(),
        }
    }

    /// Encode to `path`, format chosen by extension.
    ///
    /// Formats without 16-bit support get 8-bit samples; JPEG loses alpha.
    pub fn save(self, path: &Path) -> Result<(), ComposeError> {
        let encode_err = |source| ComposeError::Encode {
            path: path.to_path_buf(),
            source,
        };
        let format = ImageFormat::from_path(path).map_err(encode_err)?;

        let mut finished = self;
        if let Self::Sixteen(r) = &finished
            && !supports_16_bit(format)
        {
            warn!(format = ?format, "16-bit output not supported, writing 8-bit");
            finished = Self::Eight(r.requantize(255));
        }
        if format == ImageFormat::Jpeg {
            finished = match finished {
                Self::Eight(r) => Self::Eight(r.without_alpha()),
                Self::Sixteen(r) => Self::Sixteen(r.without_alpha()),
            };
        }

        let img = match finished {
            Self::Eight(r) => DynamicImage::from(r),
            Self::Sixteen(r) => DynamicImage::from(r),
        };
        img.save_with_format(path, format).map_err(encode_err)
    }
}

fn supports_16_bit(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Pnm
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    #[test]
    fn dynamic_conversion_keeps_depth() {
        let gray8 = DynamicImage::ImageLuma8(ImageBuffer::from_raw(2, 1, vec![3u8, 250]).unwrap());
        let r = raster_from_dynamic(gray8);
        assert_eq!((r.channels(), r.maxval()), (1, 255));
        assert_eq!(r.as_raw(), [3, 250]);

        let rgb16 =
            DynamicImage::ImageRgb16(ImageBuffer::from_raw(1, 1, vec![1u16, 2, 65535]).unwrap());
        let r = raster_from_dynamic(rgb16);
        assert_eq!((r.channels(), r.maxval()), (3, 65535));
        assert_eq!(r.as_raw(), [1, 2, 65535]);
    }

    #[test]
    fn raster_layout_picks_encoder_variant() {
        let gray_alpha = Raster::filled(Size::new(2, 2), 2, 65535, 7u16);
        assert!(matches!(
            DynamicImage::from(gray_alpha),
            DynamicImage::ImageLumaA16(_)
        ));
        let rgb = Raster::filled(Size::new(2, 2), 3, 255, 7u8);
        assert!(matches!(DynamicImage::from(rgb), DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn memory_source_missing_path_is_decode_error() {
        let src = MemorySource::new();
        assert!(matches!(
            src.decode(Path::new("nope.png")),
            Err(ComposeError::Decode { .. })
        ));
    }

    #[test]
    fn sixteen_bit_formats() {
        assert!(supports_16_bit(ImageFormat::Png));
        assert!(!supports_16_bit(ImageFormat::Jpeg));
    }
}
