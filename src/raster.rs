//! Pixel buffers with an explicit maximum sample value.
//!
//! Storage and geometry are `image` buffers; this module only adds `maxval`
//! and the conversions between sample depths.

use core::fmt;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, LumaA, Pixel, Primitive, Rgb, Rgba};
use num_traits::{NumCast, PrimInt};

use crate::layout::{Rect, Size};

/// An unsigned integer sample type (`u8` or `u16`).
pub trait Sample: Primitive + PrimInt + Default + fmt::Debug + Send + Sync + 'static {
    /// Largest value the type can hold.
    const MAX_VALUE: u32;

    /// Value scaled to `0.0..=1.0` relative to `maxval`.
    fn to_unit(self, maxval: u32) -> f32 {
        self.to_f32().unwrap_or(0.0) / maxval.max(1) as f32
    }

    /// Inverse of [`to_unit`](Self::to_unit), rounded and clamped.
    fn from_unit(unit: f32, maxval: u32) -> Self {
        let max = maxval.min(Self::MAX_VALUE) as f32;
        let v = (unit * maxval as f32).round().clamp(0.0, max);
        <Self as NumCast>::from(v).unwrap_or_else(Self::zero)
    }
}

impl Sample for u8 {
    const MAX_VALUE: u32 = u8::MAX as u32;
}

impl Sample for u16 {
    const MAX_VALUE: u32 = u16::MAX as u32;
}

type Buffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// One buffer per supported channel layout.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Pixels<T: Sample>
where
    Luma<T>: Pixel<Subpixel = T>,
    LumaA<T>: Pixel<Subpixel = T>,
    Rgb<T>: Pixel<Subpixel = T>,
    Rgba<T>: Pixel<Subpixel = T>,
{
    Gray(Buffer<Luma<T>>),
    GrayAlpha(Buffer<LumaA<T>>),
    Rgb(Buffer<Rgb<T>>),
    Rgba(Buffer<Rgba<T>>),
}

/// Evaluate `$body` with `$b` bound to whichever buffer `$pixels` holds.
macro_rules! with_buffer {
    ($pixels:expr, $b:ident => $body:expr) => {
        match $pixels {
            Pixels::Gray($b) => $body,
            Pixels::GrayAlpha($b) => $body,
            Pixels::Rgb($b) => $body,
            Pixels::Rgba($b) => $body,
        }
    };
}

/// Like `with_buffer!`, wrapping the resulting buffer in the same layout.
macro_rules! map_buffer {
    ($pixels:expr, $b:ident => $body:expr) => {
        match $pixels {
            Pixels::Gray($b) => Pixels::Gray($body),
            Pixels::GrayAlpha($b) => Pixels::GrayAlpha($body),
            Pixels::Rgb($b) => Pixels::Rgb($body),
            Pixels::Rgba($b) => Pixels::Rgba($body),
        }
    };
}

fn rebuild<P, Q>(b: &Buffer<P>, f: impl Fn(&P) -> Q) -> Buffer<Q>
where
    P: Pixel,
    Q: Pixel,
{
    ImageBuffer::from_fn(b.width(), b.height(), |x, y| f(b.get_pixel(x, y)))
}

/// Channel-interleaved image buffer (gray, gray+alpha, RGB or RGBA).
///
/// `maxval` is the largest sample value the source could represent (255 for
/// 8-bit, 65535 for 16-bit) and may be smaller than `T::MAX_VALUE`: 8-bit
/// images live in `Raster<u16>` during compositing.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster<T: Sample>
where
    Luma<T>: Pixel<Subpixel = T>,
    LumaA<T>: Pixel<Subpixel = T>,
    Rgb<T>: Pixel<Subpixel = T>,
    Rgba<T>: Pixel<Subpixel = T>,
{
    pixels: Pixels<T>,
    maxval: u32,
}

impl<T: Sample> fmt::Debug for Raster<T>
where
    Luma<T>: Pixel<Subpixel = T>,
    LumaA<T>: Pixel<Subpixel = T>,
    Rgb<T>: Pixel<Subpixel = T>,
    Rgba<T>: Pixel<Subpixel = T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Raster({}x{}x{}, maxval {})",
            self.width(),
            self.height(),
            self.channels(),
            self.maxval
        )
    }
}

impl<T: Sample> Raster<T>
where
    Luma<T>: Pixel<Subpixel = T>,
    LumaA<T>: Pixel<Subpixel = T>,
    Rgb<T>: Pixel<Subpixel = T>,
    Rgba<T>: Pixel<Subpixel = T>,
{
    pub(crate) fn from_pixels(pixels: Pixels<T>, maxval: u32) -> Self {
        Self { pixels, maxval }
    }

    pub(crate) fn into_pixels(self) -> Pixels<T> {
        self.pixels
    }

    /// A buffer with every sample set to `value`.
    ///
    /// # Panics
    ///
    /// If `channels` is not between 1 and 4.
    pub fn filled(size: Size, channels: u8, maxval: u32, value: T) -> Self {
        let (w, h) = (size.width, size.height);
        let pixels = match channels {
            1 => Pixels::Gray(ImageBuffer::from_pixel(w, h, Luma([value]))),
            2 => Pixels::GrayAlpha(ImageBuffer::from_pixel(w, h, LumaA([value; 2]))),
            3 => Pixels::Rgb(ImageBuffer::from_pixel(w, h, Rgb([value; 3]))),
            4 => Pixels::Rgba(ImageBuffer::from_pixel(w, h, Rgba([value; 4]))),
            other => panic!("unsupported channel count {other}"),
        };
        Self { pixels, maxval }
    }

    /// Wrap row-major interleaved samples. `None` if the length does not
    /// match or `channels` is not between 1 and 4.
    pub fn from_raw(size: Size, channels: u8, maxval: u32, data: Vec<T>) -> Option<Self> {
        let (w, h) = (size.width, size.height);
        if data.len() != w as usize * h as usize * channels as usize {
            return None;
        }
        let pixels = match channels {
            1 => Pixels::Gray(ImageBuffer::from_raw(w, h, data)?),
            2 => Pixels::GrayAlpha(ImageBuffer::from_raw(w, h, data)?),
            3 => Pixels::Rgb(ImageBuffer::from_raw(w, h, data)?),
            4 => Pixels::Rgba(ImageBuffer::from_raw(w, h, data)?),
            _ => return None,
        };
        Some(Self { pixels, maxval })
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn width(&self) -> u32 {
        with_buffer!(&self.pixels, b => b.width())
    }

    pub fn height(&self) -> u32 {
        with_buffer!(&self.pixels, b => b.height())
    }

    pub fn channels(&self) -> u8 {
        match &self.pixels {
            Pixels::Gray(_) => 1,
            Pixels::GrayAlpha(_) => 2,
            Pixels::Rgb(_) => 3,
            Pixels::Rgba(_) => 4,
        }
    }

    pub fn maxval(&self) -> u32 {
        self.maxval
    }

    /// Gray+alpha or RGBA.
    pub fn has_alpha(&self) -> bool {
        matches!(self.pixels, Pixels::GrayAlpha(_) | Pixels::Rgba(_))
    }

    pub fn as_raw(&self) -> &[T] {
        with_buffer!(&self.pixels, b => b.as_raw().as_slice())
    }

    pub fn into_raw(self) -> Vec<T> {
        with_buffer!(self.pixels, b => b.into_raw())
    }

    /// Samples of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        with_buffer!(&self.pixels, b => b.get_pixel(x, y).channels())
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [T] {
        with_buffer!(&mut self.pixels, b => b.get_pixel_mut(x, y).channels_mut())
    }

    /// Copy of the region `rect`, clamped to the buffer.
    pub fn crop(&self, rect: Rect) -> Self {
        let r = rect.clamp_to(self.width(), self.height());
        let pixels = map_buffer!(&self.pixels, b => {
            imageops::crop_imm(b, r.x, r.y, r.width, r.height).to_image()
        });
        Self::from_pixels(pixels, self.maxval)
    }

    /// Write `src` with its top-left corner at `(x, y)`, clipped to this
    /// buffer. Samples are copied verbatim; `maxval` of `self` is kept.
    ///
    /// # Panics
    ///
    /// If the channel counts differ.
    pub fn blit(&mut self, src: &Self, x: u32, y: u32) {
        let (x, y) = (<i64 as From<u32>>::from(x), <i64 as From<u32>>::from(y));
        let (ours, theirs) = (self.channels(), src.channels());
        match (&mut self.pixels, &src.pixels) {
            (Pixels::Gray(dst), Pixels::Gray(top)) => imageops::replace(dst, top, x, y),
            (Pixels::GrayAlpha(dst), Pixels::GrayAlpha(top)) => imageops::replace(dst, top, x, y),
            (Pixels::Rgb(dst), Pixels::Rgb(top)) => imageops::replace(dst, top, x, y),
            (Pixels::Rgba(dst), Pixels::Rgba(top)) => imageops::replace(dst, top, x, y),
            _ => panic!("channel count mismatch: {theirs} into {ours}"),
        }
    }

    /// Drop the alpha channel if there is one.
    pub fn without_alpha(self) -> Self {
        let pixels = match self.pixels {
            Pixels::GrayAlpha(b) => Pixels::Gray(rebuild(&b, |p| Luma([p.0[0]]))),
            Pixels::Rgba(b) => Pixels::Rgb(rebuild(&b, |p| Rgb([p.0[0], p.0[1], p.0[2]]))),
            opaque => opaque,
        };
        Self::from_pixels(pixels, self.maxval)
    }

    /// Nearest-neighbour upscale by repeating each pixel `kx` times across and
    /// each row `ky` times down.
    pub fn repeat(&self, kx: u32, ky: u32) -> Self {
        if kx == 1 && ky == 1 {
            return self.clone();
        }
        let pixels = map_buffer!(&self.pixels, b => {
            ImageBuffer::from_fn(b.width() * kx, b.height() * ky, |x, y| {
                *b.get_pixel(x / kx, y / ky)
            })
        });
        Self::from_pixels(pixels, self.maxval)
    }

    /// Swap rows and columns.
    pub fn transposed(&self) -> Self {
        let pixels = map_buffer!(&self.pixels, b => {
            imageops::flip_horizontal(&imageops::rotate90(b))
        });
        Self::from_pixels(pixels, self.maxval)
    }

    /// Resample to `size` with `filter`, keeping `maxval`.
    pub fn resize(&self, size: Size, filter: FilterType) -> Self {
        if self.size() == size {
            return self.clone();
        }
        let pixels = map_buffer!(&self.pixels, b => {
            imageops::resize(b, size.width, size.height, filter)
        });
        Self::from_pixels(pixels, self.maxval)
    }

    /// Rescale every sample from `self.maxval` to `maxval` and store it as `U`.
    pub fn requantize<U: Sample>(&self, maxval: u32) -> Raster<U>
    where
        Luma<U>: Pixel<Subpixel = U>,
        LumaA<U>: Pixel<Subpixel = U>,
        Rgb<U>: Pixel<Subpixel = U>,
        Rgba<U>: Pixel<Subpixel = U>,
    {
        let from = self.maxval;
        let convert = move |v: T| {
            if maxval == from {
                <U as NumCast>::from(v).unwrap_or_else(U::max_value)
            } else {
                U::from_unit(v.to_unit(from), maxval)
            }
        };
        let pixels = match &self.pixels {
            Pixels::Gray(b) => Pixels::Gray(rebuild(b, |p| Luma(p.0.map(convert)))),
            Pixels::GrayAlpha(b) => Pixels::GrayAlpha(rebuild(b, |p| LumaA(p.0.map(convert)))),
            Pixels::Rgb(b) => Pixels::Rgb(rebuild(b, |p| Rgb(p.0.map(convert)))),
            Pixels::Rgba(b) => Pixels::Rgba(rebuild(b, |p| Rgba(p.0.map(convert)))),
        };
        Raster::from_pixels(pixels, maxval)
    }
}
