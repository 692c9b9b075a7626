use parking_lot::{Mutex, MutexGuard};

use panbrot_core::Point;

/// Flat per-pixel iteration state, addressed by `row * width + col`.
///
/// Cells are allocated once and reset in place every epoch. Each cell has
/// its own lock; within an epoch every index is owned by at most one worker,
/// so the locks are uncontended and only make the ownership hand-off sound.
pub struct Grid {
    width: u32,
    height: u32,
    cells: Box<[Mutex<Point>]>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let cells = (0..width as usize * height as usize)
            .map(|_| Mutex::new(Point::default()))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    /// Copy of the point at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Point {
        *self.cells[index].lock()
    }

    #[inline]
    pub fn set(&self, index: usize, point: Point) {
        *self.cells[index].lock() = point;
    }

    #[inline]
    pub(crate) fn lock(&self, index: usize) -> MutexGuard<'_, Point> {
        self.cells[index].lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panbrot_core::Complex;

    #[test]
    fn row_major_addressing() {
        let g = Grid::new(6, 4);
        assert_eq!(g.len(), 24);
        assert_eq!(g.index(0, 0), 0);
        assert_eq!(g.index(5, 0), 5);
        assert_eq!(g.index(0, 1), 6);
        assert_eq!(g.index(5, 3), 23);
    }

    #[test]
    fn set_then_get() {
        let g = Grid::new(2, 2);
        let p = Point::new(Complex::ZERO, Complex::new(1.0, -1.0));
        g.set(3, p);
        assert_eq!(g.get(3), p);
        assert_eq!(g.get(0), Point::default());
    }
}
