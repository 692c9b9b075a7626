use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use panbrot_core::{FractalMode, Point, Viewport};

use crate::grid::Grid;

/// Whether an epoch keeps any of the previous pixel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochKind {
    /// Every cell is seeded fresh.
    Full,
    /// Cells still on screen after a translation are carried over.
    Partial,
}

/// The structural change an epoch applies to the grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same geometry, fresh seeds (new seed value or explicit reload).
    /// The current selector is left alone.
    Reload,
    /// New extent or centre (zoom, reset): flip and seed every cell.
    Rescale,
    /// Whole-pixel translation: flip and carry the overlap forward.
    Shift { dx: i32, dy: i32 },
}

impl Transition {
    pub fn kind(&self) -> EpochKind {
        match self {
            Self::Shift { .. } => EpochKind::Partial,
            Self::Reload | Self::Rescale => EpochKind::Full,
        }
    }

    /// Whether the epoch swaps which grid is current.
    pub fn flips(&self) -> bool {
        !matches!(self, Self::Reload)
    }
}

/// The destination rectangle that survives a `(dx, dy)` shift.
///
/// Destination `(col, row)` inside the rectangle takes its point from
/// `(col - dx, row - dy)` in the previous grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    dx: i32,
    dy: i32,
    cols: Range<u32>,
    rows: Range<u32>,
}

impl Overlap {
    /// `None` when the shift moves every pixel off screen.
    pub fn new(dx: i32, dy: i32, width: u32, height: u32) -> Option<Self> {
        let cols = span(dx, width)?;
        let rows = span(dy, height)?;
        Some(Self { dx, dy, cols, rows })
    }

    #[inline]
    pub fn contains(&self, col: u32, row: u32) -> bool {
        self.cols.contains(&col) && self.rows.contains(&row)
    }

    /// Source coordinates in the previous grid for a destination inside
    /// the overlap.
    #[inline]
    pub fn source(&self, col: u32, row: u32) -> (u32, u32) {
        ((col as i64 - self.dx as i64) as u32, (row as i64 - self.dy as i64) as u32)
    }

    pub fn cols(&self) -> Range<u32> {
        self.cols.clone()
    }

    pub fn rows(&self) -> Range<u32> {
        self.rows.clone()
    }
}

fn span(shift: i32, extent: u32) -> Option<Range<u32>> {
    if shift.unsigned_abs() >= extent {
        return None;
    }
    let magnitude = shift.unsigned_abs();
    if shift >= 0 {
        Some(magnitude..extent)
    } else {
        Some(0..extent - magnitude)
    }
}

/// Counts from preparing one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowTally {
    pub copied: usize,
    pub seeded: usize,
}

/// Two grids and a selector naming the one the active epoch works on.
///
/// The other grid holds the previous epoch's state and is only read, as the
/// source of carry-over copies, until the next flip.
pub struct DoubleBuffer {
    grids: [Grid; 2],
    current: AtomicUsize,
}

impl DoubleBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            grids: [Grid::new(width, height), Grid::new(width, height)],
            current: AtomicUsize::new(0),
        }
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn current(&self) -> &Grid {
        &self.grids[self.current_index()]
    }

    pub fn previous(&self) -> &Grid {
        &self.grids[1 - self.current_index()]
    }

    /// Swap the roles of the two grids. Must only run while no worker is
    /// touching either grid.
    pub fn flip(&self) -> usize {
        let next = 1 - self.current_index();
        self.current.store(next, Ordering::Release);
        next
    }

    /// Reset every cell of `row` in the current grid, either copied from the
    /// previous grid (inside `overlap`) or seeded fresh from `viewport`.
    ///
    /// `visit` sees each prepared cell once, in column order.
    pub fn prepare_row(
        &self,
        row: u32,
        viewport: &Viewport,
        mode: &FractalMode,
        overlap: Option<&Overlap>,
        mut visit: impl FnMut(usize, &Point),
    ) -> RowTally {
        let current = self.current();
        let previous = self.previous();
        let mut tally = RowTally::default();

        for col in 0..current.width() {
            let index = current.index(col, row);
            let point = match overlap.filter(|o| o.contains(col, row)) {
                Some(o) => {
                    let (src_col, src_row) = o.source(col, row);
                    tally.copied += 1;
                    previous.get(previous.index(src_col, src_row))
                }
                None => {
                    tally.seeded += 1;
                    mode.seed(viewport.pixel_to_complex(col, row))
                }
            };
            current.set(index, point);
            visit(index, &point);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panbrot_core::Complex;

    #[test]
    fn overlap_for_positive_shift() {
        let o = Overlap::new(10, 3, 100, 50).unwrap();
        assert_eq!(o.cols(), 10..100);
        assert_eq!(o.rows(), 3..50);
        assert_eq!(o.source(10, 3), (0, 0));
        assert!(!o.contains(9, 10));
    }

    #[test]
    fn overlap_for_negative_shift() {
        let o = Overlap::new(-10, -3, 100, 50).unwrap();
        assert_eq!(o.cols(), 0..90);
        assert_eq!(o.rows(), 0..47);
        assert_eq!(o.source(0, 0), (10, 3));
        assert_eq!(o.source(89, 46), (99, 49));
    }

    #[test]
    fn shift_off_screen_has_no_overlap() {
        assert!(Overlap::new(100, 0, 100, 50).is_none());
        assert!(Overlap::new(0, -50, 100, 50).is_none());
        assert!(Overlap::new(99, 49, 100, 50).is_some());
    }

    #[test]
    fn transition_kinds() {
        assert_eq!(Transition::Reload.kind(), EpochKind::Full);
        assert_eq!(Transition::Rescale.kind(), EpochKind::Full);
        assert_eq!(Transition::Shift { dx: 1, dy: 0 }.kind(), EpochKind::Partial);
        assert!(!Transition::Reload.flips());
        assert!(Transition::Rescale.flips());
    }

    #[test]
    fn flip_swaps_roles() {
        let db = DoubleBuffer::new(4, 4);
        assert_eq!(db.current_index(), 0);
        db.current().set(0, Point::new(Complex::ZERO, Complex::new(1.0, 0.0)));
        assert_eq!(db.flip(), 1);
        assert_eq!(db.previous().get(0).c, Complex::new(1.0, 0.0));
        assert_eq!(db.flip(), 0);
    }

    #[test]
    fn prepare_row_seeds_fresh_cells() {
        let db = DoubleBuffer::new(4, 2);
        let vp = Viewport::new(Complex::ZERO, 2.0, 4, 2).unwrap();
        let mode = FractalMode::mandelbrot();
        let mut seen = Vec::new();
        let tally = db.prepare_row(1, &vp, &mode, None, |i, p| seen.push((i, *p)));

        assert_eq!(tally, RowTally { copied: 0, seeded: 4 });
        assert_eq!(seen.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![4, 5, 6, 7]);
        for (i, p) in seen {
            let col = (i % 4) as u32;
            assert_eq!(p.c, vp.pixel_to_complex(col, 1));
            assert_eq!(p.steps, 0);
            assert!(!p.finished);
        }
    }

    #[test]
    fn prepare_row_carries_overlap_verbatim() {
        let db = DoubleBuffer::new(4, 2);
        let vp = Viewport::new(Complex::ZERO, 2.0, 4, 2).unwrap();
        let mode = FractalMode::mandelbrot();
        let done = Point {
            z: Complex::new(3.0, 3.0),
            c: Complex::new(0.5, 0.5),
            steps: 42,
            finished: true,
        };
        db.current().set(db.current().index(0, 0), done);
        db.flip();

        let overlap = Overlap::new(1, 0, 4, 2).unwrap();
        let tally = db.prepare_row(0, &vp.panned(1, 0), &mode, Some(&overlap), |_, _| {});
        assert_eq!(tally, RowTally { copied: 3, seeded: 1 });
        assert_eq!(db.current().get(1), done);
        assert_eq!(db.current().get(0).steps, 0);
    }
}
