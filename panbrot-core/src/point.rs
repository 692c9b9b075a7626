use crate::complex::Complex;
use crate::escape::{advance, Escape, EscapeParams};

/// Per-pixel iteration state.
///
/// `steps` counts every iteration consumed so far; `finished` flips once the
/// orbit leaves the bailout radius and never flips back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub z: Complex,
    pub c: Complex,
    pub steps: u32,
    pub finished: bool,
}

/// What one chunk of work did to a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Still bounded and below the ceiling; evaluate again later.
    Pending,
    /// Escaped; `steps` now holds the escape time.
    Escaped,
    /// Still bounded but the ceiling is reached; treated as inside the set.
    Exhausted,
}

impl Point {
    pub fn new(z: Complex, c: Complex) -> Self {
        Self {
            z,
            c,
            steps: 0,
            finished: false,
        }
    }

    /// Whether another chunk may run on this point.
    #[inline]
    pub fn needs_work(&self, params: &EscapeParams) -> bool {
        !self.finished && self.steps < params.max_steps
    }

    /// Run one bounded chunk of the escape iteration in place.
    pub fn step(&mut self, params: &EscapeParams) -> Progress {
        let budget = params.budget(self.steps);
        if self.finished || budget == 0 {
            return if self.finished {
                Progress::Escaped
            } else {
                Progress::Exhausted
            };
        }

        let (z, outcome) = advance(self.z, self.c, budget, params.escape_radius_sq());
        self.z = z;
        match outcome {
            Escape::Diverged(k) => {
                self.steps += k;
                self.finished = true;
                Progress::Escaped
            }
            Escape::Bounded => {
                self.steps += budget;
                if self.steps < params.max_steps {
                    Progress::Pending
                } else {
                    Progress::Exhausted
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EscapeParams {
        EscapeParams::new(2.0, 4, 10).unwrap()
    }

    #[test]
    fn escaping_point_records_escape_index() {
        let mut p = Point::new(Complex::ZERO, Complex::new(1.0, 0.0));
        assert_eq!(p.step(&params()), Progress::Escaped);
        assert!(p.finished);
        assert_eq!(p.steps, 2);
        assert!(!p.needs_work(&params()));
    }

    #[test]
    fn bounded_point_walks_up_to_the_ceiling() {
        let params = params();
        let mut p = Point::new(Complex::ZERO, Complex::ZERO);
        assert_eq!(p.step(&params), Progress::Pending);
        assert_eq!(p.steps, 4);
        assert_eq!(p.step(&params), Progress::Pending);
        assert_eq!(p.steps, 8);
        // Last chunk is cut to 2 so the total lands exactly on the ceiling.
        assert_eq!(p.step(&params), Progress::Exhausted);
        assert_eq!(p.steps, 10);
        assert!(!p.finished);
        assert!(!p.needs_work(&params));

        assert_eq!(p.step(&params), Progress::Exhausted);
        assert_eq!(p.steps, 10);
    }

    #[test]
    fn steps_are_cumulative_across_chunks() {
        // Just past the cardioid cusp: escapes after a few dozen updates.
        let params = EscapeParams::new(2.0, 4, 4096).unwrap();
        let c = Complex::new(0.26, 0.0);
        let mut chunked = Point::new(Complex::ZERO, c);
        while chunked.step(&params) == Progress::Pending {}

        let (_, whole) = advance(Complex::ZERO, c, 4096, 4.0);
        match whole {
            Escape::Diverged(k) => assert_eq!(chunked.steps, k),
            Escape::Bounded => assert!(!chunked.finished),
        }
    }
}
