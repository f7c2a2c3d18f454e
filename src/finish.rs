//! Output finishing: downsample and pick the output bit depth.

use image::imageops::FilterType;
use tracing::debug;

use crate::codec::Finished;
use crate::config::MAX_DOWNSAMPLE;
use crate::error::ComposeError;
use crate::layout::downsampled;
use crate::raster::Raster;

/// Downsample `canvas` by `2^downsample` and narrow it for the encoder.
///
/// Canvases whose `maxval` fits in a byte come out as 8-bit samples without
/// rescaling. `force_8bit` rescales deeper canvases to `0..=255`; otherwise
/// they stay 16-bit with their own `maxval`. Triangle weights are
/// non-negative, so 8-bit content in a 16-bit buffer never overshoots 255.
pub fn finish(
    canvas: Raster<u16>,
    downsample: u8,
    force_8bit: bool,
) -> Result<Finished, ComposeError> {
    if downsample > MAX_DOWNSAMPLE {
        return Err(ComposeError::InvalidDownsample(downsample));
    }

    let canvas = if downsample == 0 {
        canvas
    } else {
        let target = downsampled(canvas.size(), downsample);
        debug!(
            from_w = canvas.width(),
            from_h = canvas.height(),
            to_w = target.width,
            to_h = target.height,
            "downsampling"
        );
        canvas.resize(target, FilterType::Triangle)
    };

    let maxval = canvas.maxval();
    Ok(if maxval <= 255 {
        Finished::Eight(canvas.requantize(maxval))
    } else if force_8bit {
        Finished::Eight(canvas.requantize(255))
    } else {
        Finished::Sixteen(canvas)
    })
}
