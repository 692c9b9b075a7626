use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::point::Point;

/// Which field of a [`Point`] the plane coordinate is seeded into.
///
/// Both modes iterate the same `z ← z² + c`; they differ only in what is
/// held fixed. The fixed value is the *seed* of the raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FractalMode {
    /// `c` is the plane coordinate; every orbit starts at `z0`.
    Mandelbrot { z0: Complex },

    /// `z` starts at the plane coordinate; `c` is fixed for the whole raster.
    Julia { c: Complex },
}

impl FractalMode {
    /// Centre of the period-3 bulb (the "Douady rabbit"), whose Julia set
    /// has a solid interior.
    pub const DEFAULT_JULIA_C: Complex = Complex::new(-0.1226, 0.7449);

    pub fn mandelbrot() -> Self {
        Self::Mandelbrot { z0: Complex::ZERO }
    }

    pub fn julia(c: Complex) -> Self {
        Self::Julia { c }
    }

    /// Fresh point for the plane coordinate `plane`.
    #[inline]
    pub fn seed(&self, plane: Complex) -> Point {
        match *self {
            Self::Mandelbrot { z0 } => Point::new(z0, plane),
            Self::Julia { c } => Point::new(plane, c),
        }
    }

    /// The value held fixed across the raster.
    pub fn seed_value(&self) -> Complex {
        match *self {
            Self::Mandelbrot { z0 } => z0,
            Self::Julia { c } => c,
        }
    }

    /// Same mode with a different fixed value.
    pub fn with_seed(self, seed: Complex) -> Self {
        match self {
            Self::Mandelbrot { .. } => Self::Mandelbrot { z0: seed },
            Self::Julia { .. } => Self::Julia { c: seed },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mandelbrot { .. } => "Mandelbrot",
            Self::Julia { .. } => "Julia",
        }
    }
}

impl Default for FractalMode {
    fn default() -> Self {
        Self::mandelbrot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandelbrot_seeds_c() {
        let plane = Complex::new(-0.5, 0.25);
        let p = FractalMode::mandelbrot().seed(plane);
        assert_eq!(p.c, plane);
        assert_eq!(p.z, Complex::ZERO);
        assert_eq!(p.steps, 0);
        assert!(!p.finished);
    }

    #[test]
    fn julia_seeds_z() {
        let plane = Complex::new(0.1, -0.2);
        let mode = FractalMode::julia(FractalMode::DEFAULT_JULIA_C);
        let p = mode.seed(plane);
        assert_eq!(p.z, plane);
        assert_eq!(p.c, FractalMode::DEFAULT_JULIA_C);
    }

    #[test]
    fn with_seed_keeps_the_mode() {
        let seed = Complex::new(0.3, 0.3);
        let m = FractalMode::mandelbrot().with_seed(seed);
        assert_eq!(m, FractalMode::Mandelbrot { z0: seed });
        assert_eq!(m.seed_value(), seed);

        let j = FractalMode::julia(Complex::ZERO).with_seed(seed);
        assert_eq!(j, FractalMode::Julia { c: seed });
    }

    #[test]
    fn serde_uses_a_kind_tag() {
        let json = serde_json::to_string(&FractalMode::julia(Complex::new(1.0, 2.0))).unwrap();
        assert!(json.contains(r#""kind":"julia""#));
        let back: FractalMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FractalMode::julia(Complex::new(1.0, 2.0)));
    }
}
