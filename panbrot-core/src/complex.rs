use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// A point on the complex plane as a pair of `f64` components.
///
/// `Copy` and allocation-free so grid cells can hold it by value and the
/// escape loop can keep it in registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns `re² + im²`; the escape test compares this against the
    /// squared bailout radius instead of taking a square root.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Returns `self²`.
    #[inline]
    pub fn square(self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }
}

impl Add for Complex {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl AddAssign for Complex {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl Sub for Complex {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{} + {}i", self.re, self.im)
        } else {
            write!(f, "{} - {}i", self.re, -self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn approx_eq(a: Complex, b: Complex) -> bool {
        (a.re - b.re).abs() < EPSILON && (a.im - b.im).abs() < EPSILON
    }

    #[test]
    fn add_and_sub_are_componentwise() {
        let a = Complex::new(1.5, -2.0);
        let b = Complex::new(0.5, 4.0);
        assert!(approx_eq(a + b, Complex::new(2.0, 2.0)));
        assert!(approx_eq(a - b, Complex::new(1.0, -6.0)));

        let mut acc = a;
        acc += b;
        assert!(approx_eq(acc, a + b));
    }

    #[test]
    fn square_expands_the_product() {
        // (1 + i)² = 2i
        assert!(approx_eq(Complex::new(1.0, 1.0).square(), Complex::new(0.0, 2.0)));
        // (-0.75 + 0.3i)² = 0.4725 - 0.45i
        assert!(approx_eq(Complex::new(-0.75, 0.3).square(), Complex::new(0.4725, -0.45)));
    }

    #[test]
    fn norm_sq_skips_the_root() {
        assert_eq!(Complex::new(3.0, 4.0).norm_sq(), 25.0);
        assert_eq!(Complex::ZERO.norm_sq(), 0.0);
    }

    #[test]
    fn display_shows_sign_of_imaginary_part() {
        assert_eq!(Complex::new(1.0, -2.0).to_string(), "1 - 2i");
        assert_eq!(Complex::new(-0.75, 0.0).to_string(), "-0.75 + 0i");
    }
}
