use tracing::{debug, info};

use super::{Compositor, blank_canvas, decoded_mismatch, ensure_channels};
use crate::error::ComposeError;
use crate::grid::{Entry, ResolvedGrid};
use crate::layout::mosaic_cells;
use crate::raster::Raster;

/// One image-sized canvas where each cell shows the matching region of its
/// own source.
///
/// Every source must have the size of the first. Each slot writes from its
/// cell origin to the image's bottom-right corner, in manifest order, so a
/// later slot overwrites the spill of an earlier one. Blank slots write
/// nothing and show whatever earlier slots left there.
pub(super) fn compose(
    ctx: &Compositor<'_>,
    grid: &ResolvedGrid,
) -> Result<Raster<u16>, ComposeError> {
    let sizes = ctx.header_sizes(grid.inputs())?;
    let Some(&reference) = sizes.first() else {
        return Err(ComposeError::EmptyInput);
    };
    if sizes.iter().any(|s| *s != reference) {
        return Err(ComposeError::dimensions(
            sizes.iter().map(|s| s.width).collect(),
            sizes.iter().map(|s| s.height).collect(),
        ));
    }

    let cells = mosaic_cells(reference, grid.shape);
    debug!(
        width = reference.width,
        height = reference.height,
        "mosaic canvas"
    );

    let mut canvas: Option<Raster<u16>> = None;
    for (slot, entry) in grid.manifest.iter().enumerate() {
        let Entry::Real(path) = entry else {
            continue;
        };
        let (r, c) = grid.shape.cell(slot);
        info!("{} => slot ({r}, {c})", path.display());

        let tile = ctx.decode(path)?.without_alpha();
        if tile.size() != reference {
            return Err(decoded_mismatch(grid, &sizes, path, tile.size()));
        }
        let canvas = canvas.get_or_insert_with(|| blank_canvas(reference, &tile));
        ensure_channels(path, canvas, &tile)?;

        let cell = cells[slot];
        let mut piece = tile.crop(cell);
        if piece.maxval() != canvas.maxval() {
            piece = piece.requantize(canvas.maxval());
        }
        ctx.label(&mut piece, path);
        canvas.blit(&piece, cell.x, cell.y);
    }
    canvas.ok_or(ComposeError::EmptyInput)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::super::testing::{Block, StaleHeader, numbered, solid};
    use super::*;
    use crate::codec::{MemorySource, TileSource};
    use crate::config::LayoutMode;
    use crate::grid::resolve;
    use crate::label::{LABEL_OFFSET, Labeler};
    use crate::layout::{Rect, Size, mosaic_cell_size};

    fn run(src: &MemorySource, files: &[String], cols: u32, rows: u32) -> Raster<u16> {
        let mode = LayoutMode::mosaic(cols, rows);
        let grid = resolve(mode, files, false, true).unwrap();
        Compositor::new(src).compose(mode, &grid).unwrap()
    }

    /// Tile whose sample at `(x, y)` is `base + y·w + x`.
    fn ramp(w: u32, h: u32, base: u16) -> Raster<u16> {
        let data = (0..w * h).map(|i| base + i as u16).collect();
        Raster::from_raw(Size::new(w, h), 1, 65535, data).unwrap()
    }

    #[test]
    fn each_cell_shows_its_own_source() {
        let (src, files) = numbered(4, 100, 60);
        let canvas = run(&src, &files, 2, 2);
        assert_eq!(canvas.size(), Size::new(100, 60));
        assert_eq!(canvas.pixel(10, 10), [10]);
        assert_eq!(canvas.pixel(60, 10), [20]);
        assert_eq!(canvas.pixel(10, 40), [30]);
        assert_eq!(canvas.pixel(99, 59), [40]);
    }

    #[test]
    fn crop_keeps_source_coordinates() {
        let src = MemorySource::new()
            .with("a.png", ramp(8, 4, 0))
            .with("b.png", ramp(8, 4, 1000));
        let files = vec!["a.png".to_string(), "b.png".to_string()];
        let canvas = run(&src, &files, 2, 1);
        // Left half from a, right half from b, both at their original offsets.
        assert_eq!(canvas.pixel(3, 2), [2 * 8 + 3]);
        assert_eq!(canvas.pixel(4, 2), [1000 + 2 * 8 + 4]);
    }

    #[test]
    fn cascade_equals_bounded_cells_when_even() {
        let files: Vec<String> = (0..6).map(|i| format!("{i}.png")).collect();
        let mut src = MemorySource::new();
        for (i, f) in files.iter().enumerate() {
            src.insert(f, ramp(12, 6, 100 * i as u16));
        }
        let canvas = run(&src, &files, 3, 2);

        let grid = resolve(LayoutMode::mosaic(3, 2), &files, false, true).unwrap();
        let cell = mosaic_cell_size(Size::new(12, 6), grid.shape);
        let mut bounded = Raster::filled(Size::new(12, 6), 1, 65535, 0u16);
        for (slot, f) in files.iter().enumerate() {
            let (r, c) = grid.shape.cell(slot);
            let rect = Rect::new(c * cell.width, r * cell.height, cell.width, cell.height);
            let piece = src.decode(Path::new(f)).unwrap().crop(rect);
            bounded.blit(&piece, rect.x, rect.y);
        }
        assert_eq!(canvas, bounded);
    }

    #[test]
    fn remainder_comes_from_last_writer() {
        // 5 wide, 2 columns: cell width 2, column 1 spills over x = 4.
        let (src, files) = numbered(2, 5, 1);
        let canvas = run(&src, &files, 2, 1);
        assert_eq!(canvas.as_raw(), [10, 10, 20, 20, 20]);
    }

    #[test]
    fn blank_cells_show_earlier_spill() {
        let (src, files) = numbered(3, 4, 4);
        let canvas = run(&src, &files, 2, 2);
        // Slot 3 is blank; slot 2 wrote to the corner.
        assert_eq!(canvas.pixel(3, 3), [30]);
        assert_eq!(canvas.pixel(3, 0), [20]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let src = MemorySource::new()
            .with("a.png", solid(8, 8, 1))
            .with("b.png", solid(8, 9, 1));
        let files = vec!["a.png".to_string(), "b.png".to_string()];
        let grid = resolve(LayoutMode::mosaic(2, 1), &files, false, true).unwrap();
        match Compositor::new(&src).compose(LayoutMode::mosaic(2, 1), &grid) {
            Err(ComposeError::DimensionMismatch { widths, heights }) => {
                assert_eq!(widths, [8, 8]);
                assert_eq!(heights, [8, 9]);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn decoded_size_mismatch_lists_every_input() {
        let src = StaleHeader {
            inner: MemorySource::new()
                .with("a.png", solid(8, 8, 1))
                .with("b.png", solid(8, 8, 2))
                .with("c.png", solid(8, 9, 3)),
            path: "c.png".into(),
            header: Size::new(8, 8),
        };
        let files = ["a.png", "b.png", "c.png"].map(String::from);
        let mode = LayoutMode::mosaic(3, 1);
        let grid = resolve(mode, &files, false, true).unwrap();
        match Compositor::new(&src).compose(mode, &grid) {
            Err(ComposeError::DimensionMismatch { widths, heights }) => {
                assert_eq!(widths, [8, 8, 8]);
                assert_eq!(heights, [8, 8, 9]);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn label_goes_on_the_cropped_piece() {
        let (src, files) = numbered(2, 60, 30);
        let grid = resolve(LayoutMode::mosaic(2, 1), &files, false, true).unwrap();
        let canvas = Compositor::new(&src)
            .labeler(Labeler::new(&Block, 10))
            .compose(LayoutMode::mosaic(2, 1), &grid)
            .unwrap();
        let (ox, oy) = LABEL_OFFSET;
        assert_eq!(canvas.pixel(ox, oy), [255]);
        assert_eq!(canvas.pixel(30 + ox, oy), [255]);
        assert_eq!(canvas.pixel(29, 29), [10]);
    }
}
