use tracing::{debug, info};

use super::{Compositor, decoded_mismatch, ensure_channels};
use crate::error::ComposeError;
use crate::grid::ResolvedGrid;
use crate::layout::{InterleaveGeometry, Size, validate_dimensions};
use crate::raster::Raster;

/// Stack `slices` row bands, band `b` taken from source `b mod stride`.
///
/// The composite has the size of one (possibly upsampled) source. With
/// `transpose` the sources are transposed first and the result transposed
/// back, which turns row bands into column bands.
pub(super) fn compose(
    ctx: &Compositor<'_>,
    grid: &ResolvedGrid,
    slices: u32,
) -> Result<Raster<u16>, ComposeError> {
    let inputs = grid.inputs();
    let sizes = ctx.header_sizes(inputs)?;
    validate_dimensions(&sizes, grid.shape)?;

    let orient = |r: Raster<u16>| if ctx.transpose { r.transposed() } else { r };
    let Some((first_path, rest)) = inputs.split_first() else {
        return Err(ComposeError::EmptyInput);
    };

    let first = orient(ctx.decode(first_path)?.without_alpha());
    let geometry = InterleaveGeometry::compute(first.size(), slices)?;
    debug!(
        width = geometry.size.width,
        height = geometry.size.height,
        repeat = geometry.repeat,
        band_height = geometry.band_height,
        "interleave geometry"
    );
    let mut canvas = Raster::filled(geometry.size, first.channels(), first.maxval(), 0u16);

    let stride = inputs.len() as u32;
    let mut pending = Some(first);
    for (i, path) in std::iter::once(first_path).chain(rest).enumerate() {
        let bands: Vec<u32> = geometry.bands_of(i as u32, stride).collect();
        if bands.is_empty() {
            info!("{} => no bands", path.display());
            continue;
        }
        info!("{} => bands {bands:?}", path.display());

        let image = match pending.take() {
            Some(first) => first,
            None => orient(ctx.decode(path)?.without_alpha()),
        };
        let size = image.size();
        let Some(mut image) = fit(image, geometry.size) else {
            let decoded = if ctx.transpose { size.transposed() } else { size };
            return Err(decoded_mismatch(grid, &sizes, path, decoded));
        };
        ensure_channels(path, &canvas, &image)?;
        if image.maxval() != canvas.maxval() {
            image = image.requantize(canvas.maxval());
        }

        for (n, &band) in bands.iter().enumerate() {
            let rect = geometry.band(band);
            let mut piece = image.crop(rect);
            if n == 0 {
                ctx.label(&mut piece, path);
            }
            canvas.blit(&piece, rect.x, rect.y);
        }
    }

    Ok(if ctx.transpose {
        canvas.transposed()
    } else {
        canvas
    })
}

/// Upsample `image` to exactly `target` by whole-pixel repetition. `None`
/// unless both target dimensions are whole multiples of the image's.
fn fit(image: Raster<u16>, target: Size) -> Option<Raster<u16>> {
    let size = image.size();
    if size == target {
        return Some(image);
    }
    let divides = |have: u32, want: u32| have > 0 && want >= have && want % have == 0;
    (divides(size.width, target.width) && divides(size.height, target.height))
        .then(|| image.repeat(target.width / size.width, target.height / size.height))
}
