use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use super::{Compositor, blank_canvas, ensure_channels};
use crate::error::ComposeError;
use crate::grid::{Entry, ResolvedGrid};
use crate::layout::{CollageLayout, Size, validate_dimensions};
use crate::raster::Raster;

/// Tile every image edge to edge at its own footprint.
///
/// Blank slots borrow the footprint of the last real input so the canvas keeps
/// its shape; they stay white.
pub(super) fn compose(
    ctx: &Compositor<'_>,
    grid: &ResolvedGrid,
) -> Result<Raster<u16>, ComposeError> {
    let sizes = ctx.header_sizes(grid.inputs())?;
    validate_dimensions(&sizes, grid.shape)?;

    let known: HashMap<&Path, Size> = grid
        .inputs()
        .iter()
        .map(|p| p.as_path())
        .zip(sizes.iter().copied())
        .collect();
    let stand_in = *sizes.last().ok_or(ComposeError::EmptyInput)?;
    let footprints: Vec<Size> = grid
        .manifest
        .iter()
        .map(|entry| match entry {
            Entry::Real(p) => known.get(p.as_path()).copied().unwrap_or(stand_in),
            Entry::Blank => stand_in,
        })
        .collect();

    let layout = CollageLayout::compute(grid.shape, &footprints);
    debug!(
        width = layout.canvas.width,
        height = layout.canvas.height,
        "collage canvas"
    );

    let mut canvas: Option<Raster<u16>> = None;
    for (slot, entry) in grid.manifest.iter().enumerate() {
        let Entry::Real(path) = entry else {
            continue;
        };
        let (r, c) = grid.shape.cell(slot);
        info!("{} => slot ({r}, {c})", path.display());

        let mut tile = ctx.decode(path)?.without_alpha();
        let canvas = canvas.get_or_insert_with(|| blank_canvas(layout.canvas, &tile));
        ensure_channels(path, canvas, &tile)?;
        if tile.maxval() != canvas.maxval() {
            tile = tile.requantize(canvas.maxval());
        }
        ctx.label(&mut tile, path);

        let cell = layout.cells[slot];
        canvas.blit(&tile, cell.x, cell.y);
    }
    canvas.ok_or(ComposeError::EmptyInput)
}
