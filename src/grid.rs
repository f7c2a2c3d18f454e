//! Grid resolution: shape, blank padding, ordering and transposition.
//!
//! Turns a [`LayoutMode`] and the input paths into a concrete grid and a
//! manifest of exactly `rows × cols` entries. Runs before any decoding, so a
//! count mismatch never touches the filesystem.
//!
//! # Example
//!
//! ```
//! use imgrid::{Entry, LayoutMode, resolve};
//!
//! let files = ["b10.png", "b9.png", "a.png"];
//! let grid = resolve(LayoutMode::collage(2, 2), &files, false, true).unwrap();
//!
//! assert_eq!(grid.shape.rows, 2);
//! assert_eq!(grid.blanks, 1);
//! assert_eq!(grid.manifest[1], Entry::real("b9.png"));
//! assert_eq!(grid.manifest[3], Entry::Blank);
//! ```

use core::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::config::LayoutMode;
use crate::error::ComposeError;

/// Rows × columns of a resolved grid. Both are at least 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of slots.
    pub fn slots(self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Row-major `(row, col)` of a slot index.
    pub fn cell(self, slot: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((slot / cols) as u32, (slot % cols) as u32)
    }

    /// The shape with rows and columns swapped.
    pub fn swapped(self) -> Self {
        Self::new(self.cols, self.rows)
    }
}

/// One manifest slot: a real input file or a blank placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Entry {
    Real(PathBuf),
    Blank,
}

impl Entry {
    pub fn real(path: impl Into<PathBuf>) -> Self {
        Self::Real(path.into())
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Real(p) => Some(p),
            Self::Blank => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

/// Outcome of grid resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedGrid {
    pub shape: GridShape,
    /// Exactly `shape.slots()` entries, in row-major placement order.
    pub manifest: Vec<Entry>,
    /// Number of [`Entry::Blank`] slots.
    pub blanks: usize,
    inputs: Vec<PathBuf>,
}

impl ResolvedGrid {
    /// Real paths in sorted input order (before any transpose).
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Path of the last real input, whose footprint blank slots borrow.
    pub fn last_input(&self) -> Option<&Path> {
        self.inputs.last().map(PathBuf::as_path)
    }
}

/// Resolve the grid shape and manifest.
///
/// Interleave always uses a single row with one column per file; the slice
/// count does not shape the grid. Collage and mosaic use the requested shape.
/// Paths are natural-sorted unless `sort` is false, padded with blanks, then
/// transposed when asked. Interleave never transposes the manifest: its
/// `transpose` flag selects vertical slices instead.
pub fn resolve<P: AsRef<Path>>(
    mode: LayoutMode,
    files: &[P],
    transpose: bool,
    sort: bool,
) -> Result<ResolvedGrid, ComposeError> {
    if files.is_empty() {
        return Err(ComposeError::EmptyInput);
    }

    let shape = match mode {
        LayoutMode::Interleave { .. } => GridShape::new(1, files.len() as u32),
        LayoutMode::Collage { rows, cols } | LayoutMode::Mosaic { rows, cols } => {
            if rows == 0 || cols == 0 {
                return Err(ComposeError::InvalidGrid(format!("{cols}x{rows}, both must be at least 1")));
            }
            GridShape::new(rows, cols)
        }
    };

    let slots = shape.slots();
    if files.len() > slots {
        return Err(ComposeError::CountMismatch {
            files: files.len(),
            rows: shape.rows,
            cols: shape.cols,
            slots,
        });
    }
    let blanks = slots - files.len();

    let mut inputs: Vec<PathBuf> = files.iter().map(|p| p.as_ref().to_path_buf()).collect();
    if sort {
        inputs.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    }

    let mut manifest: Vec<Entry> = inputs.iter().cloned().map(Entry::Real).collect();
    manifest.resize(slots, Entry::Blank);

    if transpose && !matches!(mode, LayoutMode::Interleave { .. }) {
        manifest = transpose_order(&manifest, shape);
    }

    Ok(ResolvedGrid {
        shape,
        manifest,
        blanks,
        inputs,
    })
}

/// Reshape `items` into `shape`, transpose, and flatten back to row-major.
///
/// The item at `(r, c)` lands at flat index `c * rows + r`. Applying this
/// again with [`GridShape::swapped`] restores the original order.
///
/// # Panics
///
/// If `items.len() != shape.slots()`.
pub fn transpose_order<T: Clone>(items: &[T], shape: GridShape) -> Vec<T> {
    assert_eq!(items.len(), shape.slots(), "manifest does not fill the grid");
    let (rows, cols) = (shape.rows as usize, shape.cols as usize);
    let mut out = Vec::with_capacity(items.len());
    for c in 0..cols {
        for r in 0..rows {
            out.push(items[r * cols + c].clone());
        }
    }
    out
}

/// Natural (numeric-aware) string ordering: `img2` sorts before `img10`.
///
/// Digit runs compare by numeric value, everything else byte-wise. Ties
/// (e.g. `img01` vs `img1`) fall back to plain byte order so the result is a
/// total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut x, mut y) = (a.as_bytes(), b.as_bytes());
    loop {
        match (x.first(), y.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(cx), Some(cy)) if cx.is_ascii_digit() && cy.is_ascii_digit() => {
                let (dx, rest_x) = split_digits(x);
                let (dy, rest_y) = split_digits(y);
                let ord = cmp_numeric(dx, dy);
                if ord != Ordering::Equal {
                    return ord;
                }
                x = rest_x;
                y = rest_y;
            }
            (Some(cx), Some(cy)) => {
                if cx != cy {
                    return cx.cmp(cy);
                }
                x = &x[1..];
                y = &y[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let n = s.iter().take_while(|c| c.is_ascii_digit()).count();
    s.split_at(n)
}

/// Compare two ASCII digit runs by value, without overflow.
fn cmp_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let strip = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let a = &a[strip(a)..];
    let b = &b[strip(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(m: &[Entry]) -> Vec<String> {
        m.iter()
            .map(|e| match e {
                Entry::Real(p) => p.to_string_lossy().into_owned(),
                Entry::Blank => "-".into(),
            })
            .collect()
    }

    // ── shape ───────────────────────────────────────────────────────────

    #[test]
    fn collage_shape_is_rows_by_cols() {
        let g = resolve(LayoutMode::collage(3, 2), &["a", "b", "c", "d", "e", "f"], false, false)
            .unwrap();
        assert_eq!(g.shape, GridShape::new(2, 3));
        assert_eq!(g.blanks, 0);
    }

    #[test]
    fn interleave_is_one_row() {
        let g = resolve(LayoutMode::Interleave { slices: 7 }, &["a", "b", "c"], false, true)
            .unwrap();
        assert_eq!(g.shape, GridShape::new(1, 3));
        assert_eq!(g.blanks, 0);
    }

    #[test]
    fn cell_is_row_major() {
        let s = GridShape::new(2, 3);
        let cells: Vec<_> = (0..6).map(|i| s.cell(i)).collect();
        assert_eq!(cells, [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    // ── count ───────────────────────────────────────────────────────────

    #[test]
    fn too_few_files_pads_with_blanks() {
        let g = resolve(LayoutMode::collage(2, 2), &["a", "b", "c"], false, true).unwrap();
        assert_eq!(g.blanks, 1);
        assert_eq!(names(&g.manifest), ["a", "b", "c", "-"]);
    }

    #[test]
    fn too_many_files_fails() {
        let err = resolve(LayoutMode::collage(2, 2), &["a", "b", "c", "d", "e"], false, true);
        assert!(matches!(
            err,
            Err(ComposeError::CountMismatch {
                files: 5,
                slots: 4,
                ..
            })
        ));
    }

    #[test]
    fn no_files_fails() {
        let none: [&str; 0] = [];
        assert!(matches!(
            resolve(LayoutMode::collage(1, 1), &none, false, true),
            Err(ComposeError::EmptyInput)
        ));
    }

    #[test]
    fn blanks_equal_slots_minus_files() {
        for rows in 1..5u32 {
            for cols in 1..5u32 {
                let slots = (rows * cols) as usize;
                for n in 1..=slots {
                    let files: Vec<String> = (0..n).map(|i| format!("f{i}")).collect();
                    let g = resolve(LayoutMode::mosaic(cols, rows), &files, true, true).unwrap();
                    assert_eq!(g.blanks, slots - n);
                    assert_eq!(g.manifest.len(), slots);
                    assert_eq!(g.manifest.iter().filter(|e| e.is_blank()).count(), slots - n);
                }
            }
        }
    }

    // ── ordering ────────────────────────────────────────────────────────

    #[test]
    fn sorted_naturally() {
        let g = resolve(
            LayoutMode::collage(4, 1),
            &["img10.png", "img2.png", "img1.png", "img01b.png"],
            false,
            true,
        )
        .unwrap();
        assert_eq!(
            names(&g.manifest),
            ["img1.png", "img01b.png", "img2.png", "img10.png"]
        );
    }

    #[test]
    fn unsorted_keeps_input_order() {
        let g = resolve(LayoutMode::collage(3, 1), &["c", "a", "b"], false, false).unwrap();
        assert_eq!(names(&g.manifest), ["c", "a", "b"]);
    }

    #[test]
    fn natural_cmp_cases() {
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("a10", "a2"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
        assert_eq!(natural_cmp("a", "ab"), Ordering::Less);
        assert_eq!(natural_cmp("x007", "x7"), Ordering::Less);
        assert_eq!(natural_cmp("99999999999999999999999", "100000000000000000000000"), Ordering::Less);
        assert_eq!(natural_cmp("img_3_b", "img_3_a"), Ordering::Greater);
    }

    // ── transpose ───────────────────────────────────────────────────────

    #[test]
    fn transpose_square() {
        let g = resolve(LayoutMode::collage(2, 2), &["a", "b", "c", "d"], true, true).unwrap();
        assert_eq!(names(&g.manifest), ["a", "c", "b", "d"]);
    }

    #[test]
    fn transpose_includes_blanks() {
        // [a b c; d - -] → columns (a d) (b -) (c -)
        let g = resolve(LayoutMode::collage(3, 2), &["a", "b", "c", "d"], true, true).unwrap();
        assert_eq!(names(&g.manifest), ["a", "d", "b", "-", "c", "-"]);
    }

    #[test]
    fn transpose_is_involution_with_swapped_shape() {
        for rows in 1..6u32 {
            for cols in 1..6u32 {
                let shape = GridShape::new(rows, cols);
                let items: Vec<usize> = (0..shape.slots()).collect();
                let once = transpose_order(&items, shape);
                let twice = transpose_order(&once, shape.swapped());
                assert_eq!(twice, items, "{rows}x{cols}");
            }
        }
    }

    #[test]
    fn interleave_ignores_manifest_transpose() {
        let g = resolve(LayoutMode::Interleave { slices: 2 }, &["a", "b", "c"], true, true)
            .unwrap();
        assert_eq!(names(&g.manifest), ["a", "b", "c"]);
    }

    #[test]
    fn inputs_keep_sorted_order_after_transpose() {
        let g = resolve(LayoutMode::collage(2, 2), &["d", "c", "b"], true, true).unwrap();
        assert_eq!(g.inputs(), [PathBuf::from("b"), PathBuf::from("c"), PathBuf::from("d")]);
        assert_eq!(g.last_input(), Some(Path::new("d")));
    }
}
