use tracing::debug;

use crate::complex::Complex;
use crate::error::CoreError;

/// The visible region of the complex plane for one raster.
///
/// The region is centred on `center` and spans `±half_width` horizontally
/// and `±half_height` vertically. `half_height` is always derived from
/// `half_width` and the raster aspect, so pixels stay square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Centre of the viewport in the complex plane.
    pub center: Complex,

    half_width: f64,
    half_height: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Create a viewport over a `width`×`height` raster.
    ///
    /// Raster dimensions must be non-zero and even so the centre pixel
    /// `(width/2, height/2)` lands exactly on `center`.
    pub fn new(center: Complex, half_width: f64, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(CoreError::InvalidRaster { width, height });
        }
        if half_width <= 0.0 || !half_width.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("half width must be positive and finite, got {half_width}"),
            });
        }
        if !center.re.is_finite() || !center.im.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("center must be finite, got {center}"),
            });
        }
        Ok(Self::with_half_width(center, half_width, width, height))
    }

    fn with_half_width(center: Complex, half_width: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            half_width,
            half_height: half_width * height as f64 / width as f64,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn half_height(&self) -> f64 {
        self.half_height
    }

    /// Complex-plane units spanned by one pixel horizontally.
    #[inline]
    pub fn pitch_x(&self) -> f64 {
        self.half_width * 2.0 / self.width as f64
    }

    /// Complex-plane units spanned by one pixel vertically.
    #[inline]
    pub fn pitch_y(&self) -> f64 {
        self.half_height * 2.0 / self.height as f64
    }

    /// Map a pixel to the complex plane.
    ///
    /// `(0, 0)` is the top-left pixel; pixel-y grows downward while the
    /// imaginary axis grows upward.
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        self.subpixel_to_complex(px as f64, py as f64)
    }

    /// Like [`pixel_to_complex`](Self::pixel_to_complex) for fractional or
    /// off-raster coordinates.
    #[inline]
    pub fn subpixel_to_complex(&self, px: f64, py: f64) -> Complex {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        Complex::new(
            self.center.re + (px - half_w) * self.pitch_x(),
            self.center.im + (half_h - py) * self.pitch_y(),
        )
    }

    /// Translate by a whole-pixel drag.
    ///
    /// Positive `dx` moves the content right, so the visible plane shifts
    /// left; positive `dy` moves it down. After the shift, pixel
    /// `(col, row)` shows what `(col - dx, row - dy)` showed before.
    pub fn panned(&self, dx: i32, dy: i32) -> Self {
        let mut next = *self;
        next.center += Complex::new(-(dx as f64) * self.pitch_x(), dy as f64 * self.pitch_y());
        next
    }

    /// Scale both half-extents by `factor` around the centre.
    ///
    /// Returns `None` when `factor` is not a positive finite number or the
    /// new half width would drop below `min_half_width`.
    pub fn zoomed(&self, factor: f64, min_half_width: f64) -> Option<Self> {
        if factor <= 0.0 || !factor.is_finite() {
            debug!(factor, "Rejecting zoom: factor must be positive and finite");
            return None;
        }
        let half_width = self.half_width * factor;
        if half_width < min_half_width {
            debug!(half_width, min_half_width, "Rejecting zoom: below minimum extent");
            return None;
        }
        Some(Self::with_half_width(self.center, half_width, self.width, self.height))
    }

    /// Zoom while keeping the plane point under pixel `(px, py)` fixed on
    /// screen.
    pub fn zoomed_at(&self, factor: f64, px: i32, py: i32, min_half_width: f64) -> Option<Self> {
        let (px, py) = (px as f64, py as f64);
        let before = self.subpixel_to_complex(px, py);
        let mut next = self.zoomed(factor, min_half_width)?;
        let after = next.subpixel_to_complex(px, py);
        next.center += before - after;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn vp() -> Viewport {
        Viewport::new(Complex::new(-0.75, 0.0), 1.25, 1440, 960).unwrap()
    }

    #[test]
    fn half_height_follows_aspect() {
        let v = vp();
        assert!((v.half_height() - 1.25 * 960.0 / 1440.0).abs() < EPSILON);
        assert!((v.pitch_x() - v.pitch_y()).abs() < EPSILON);
    }

    #[test]
    fn center_pixel_maps_to_center() {
        let v = vp();
        assert_eq!(v.pixel_to_complex(720, 480), v.center);
    }

    #[test]
    fn corners_span_the_extent() {
        let v = Viewport::new(Complex::ZERO, 50.0, 100, 100).unwrap();
        let tl = v.pixel_to_complex(0, 0);
        assert!((tl.re + 50.0).abs() < EPSILON);
        assert!((tl.im - 50.0).abs() < EPSILON);
        let br = v.pixel_to_complex(99, 99);
        assert!((br.re - 49.0).abs() < EPSILON);
        assert!((br.im + 49.0).abs() < EPSILON);
    }

    #[test]
    fn invalid_rasters_are_rejected() {
        assert!(Viewport::new(Complex::ZERO, 1.0, 0, 100).is_err());
        assert!(Viewport::new(Complex::ZERO, 1.0, 100, 0).is_err());
        assert!(Viewport::new(Complex::ZERO, 1.0, 101, 100).is_err());
        assert!(Viewport::new(Complex::ZERO, 1.0, 100, 99).is_err());
    }

    #[test]
    fn invalid_extent_is_rejected() {
        assert!(Viewport::new(Complex::ZERO, 0.0, 100, 100).is_err());
        assert!(Viewport::new(Complex::ZERO, -1.0, 100, 100).is_err());
        assert!(Viewport::new(Complex::ZERO, f64::INFINITY, 100, 100).is_err());
        assert!(Viewport::new(Complex::new(f64::NAN, 0.0), 1.0, 100, 100).is_err());
    }

    #[test]
    fn pan_shifts_the_mapping_by_whole_pixels() {
        let v = vp();
        let p = v.panned(10, -7);
        for (col, row) in [(10u32, 0u32), (500, 300), (1439, 952)] {
            let now = p.pixel_to_complex(col, row);
            let before = v.pixel_to_complex(col - 10, row + 7);
            assert!((now.re - before.re).abs() < EPSILON);
            assert!((now.im - before.im).abs() < EPSILON);
        }
    }

    #[test]
    fn pan_right_moves_plane_left() {
        let p = vp().panned(1, 0);
        assert!(p.center.re < vp().center.re);
        let p = vp().panned(0, 1);
        assert!(p.center.im > vp().center.im);
    }

    #[test]
    fn zoom_scales_both_extents() {
        let z = vp().zoomed(0.5, 1e-13).unwrap();
        assert!((z.half_width() - 0.625).abs() < EPSILON);
        assert!((z.half_height() / z.half_width() - 960.0 / 1440.0).abs() < EPSILON);
        assert_eq!(z.center, vp().center);
    }

    #[test]
    fn zoom_below_minimum_is_rejected() {
        assert!(vp().zoomed(0.5, 1.0).is_none());
        assert!(vp().zoomed(0.0, 1e-13).is_none());
        assert!(vp().zoomed(-2.0, 1e-13).is_none());
        assert!(vp().zoomed(f64::NAN, 1e-13).is_none());
    }

    #[test]
    fn zoom_at_center_pixel_keeps_center() {
        let v = vp();
        let z = v.zoomed_at(0.9, 720, 480, 1e-13).unwrap();
        assert_eq!(z.center, v.center);
    }

    #[test]
    fn zoom_at_keeps_point_under_cursor() {
        let v = vp();
        let before = v.pixel_to_complex(100, 200);
        let z = v.zoomed_at(0.8, 100, 200, 1e-13).unwrap();
        let after = z.pixel_to_complex(100, 200);
        assert!((before.re - after.re).abs() < EPSILON);
        assert!((before.im - after.im).abs() < EPSILON);
    }

    #[test]
    fn aspect_survives_repeated_mutation() {
        let mut v = vp();
        for i in 0..200 {
            v = v.panned(i % 7 - 3, i % 5 - 2);
            v = v.zoomed_at(if i % 3 == 0 { 1.06 } else { 0.94 }, i, 2 * i, 1e-13).unwrap();
            let ratio = v.half_height() / v.half_width();
            assert!((ratio - 960.0 / 1440.0).abs() < 1e-12);
        }
    }
}
