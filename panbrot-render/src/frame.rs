use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::RenderError;
use crate::palette::{Palette, PaletteMode};

/// The RGBA raster shown to the consumer, one pixel per grid cell.
///
/// Each pixel is one atomic word, so workers writing disjoint indices and a
/// consumer copying the frame never need a lock. A copy taken mid-epoch may
/// mix pixels from before and after a seed pass; every pixel is always one
/// whole color.
pub struct FrameBuffer {
    palette: Palette,
    mode: PaletteMode,
    pixels: Box<[AtomicU32]>,
}

impl FrameBuffer {
    /// Create a buffer painted with the blank color (the step-0 color).
    pub fn new(width: u32, height: u32, palette: Palette, mode: PaletteMode) -> Self {
        let blank = u32::from_ne_bytes(palette.color(0, mode));
        let pixels = (0..width as usize * height as usize)
            .map(|_| AtomicU32::new(blank))
            .collect();
        Self {
            palette,
            mode,
            pixels,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Number of bytes in a full copy of the frame.
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * 4
    }

    /// Paint pixel `index` with the palette color for `steps`.
    #[inline]
    pub fn write(&self, index: usize, steps: u32) {
        let rgba = self.palette.color(steps, self.mode);
        self.pixels[index].store(u32::from_ne_bytes(rgba), Ordering::Relaxed);
    }

    /// Paint pixel `index` with the blank color.
    #[inline]
    pub fn clear(&self, index: usize) {
        self.write(index, 0);
    }

    /// Read back a single pixel.
    pub fn pixel(&self, index: usize) -> [u8; 4] {
        self.pixels[index].load(Ordering::Relaxed).to_ne_bytes()
    }

    /// Copy the whole frame into `out` (`width × height × 4` bytes).
    pub fn copy_to(&self, out: &mut [u8]) -> crate::Result<()> {
        if out.len() != self.byte_len() {
            return Err(RenderError::FrameSize {
                expected: self.byte_len(),
                actual: out.len(),
            });
        }
        for (dst, px) in out.chunks_exact_mut(4).zip(self.pixels.iter()) {
            dst.copy_from_slice(&px.load(Ordering::Relaxed).to_ne_bytes());
        }
        Ok(())
    }

    /// Copy the whole frame into a fresh byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for px in self.pixels.iter() {
            out.extend_from_slice(&px.load(Ordering::Relaxed).to_ne_bytes());
        }
        out
    }
}

/// One-bit "the frame changed" flag.
///
/// Raising an already raised signal is a no-op; the consumer learns that
/// something changed since its last poll, not how often.
#[derive(Debug, Default)]
pub struct FrameSignal {
    raised: AtomicBool,
}

impl FrameSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Test-and-clear.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameBuffer {
        FrameBuffer::new(4, 2, Palette::wikipedia(), PaletteMode::Cyclic)
    }

    #[test]
    fn new_frame_is_blank() {
        let f = frame();
        let blank = Palette::wikipedia().colors()[0];
        assert_eq!(f.byte_len(), 4 * 2 * 4);
        for px in f.to_bytes().chunks_exact(4) {
            assert_eq!(px, &blank);
        }
    }

    #[test]
    fn write_lands_at_index_times_four() {
        let f = frame();
        f.write(5, 3);
        let bytes = f.to_bytes();
        assert_eq!(&bytes[20..24], &Palette::wikipedia().colors()[3]);
        assert_eq!(f.pixel(5), Palette::wikipedia().colors()[3]);
        assert_eq!(&bytes[16..20], &Palette::wikipedia().colors()[0]);
    }

    #[test]
    fn clamped_mode_is_honoured() {
        let f = FrameBuffer::new(2, 2, Palette::wikipedia(), PaletteMode::Clamped);
        f.write(0, 500);
        assert_eq!(f.pixel(0), Palette::wikipedia().colors()[15]);
    }

    #[test]
    fn copy_to_checks_length() {
        let f = frame();
        let mut short = vec![0u8; 8];
        assert!(f.copy_to(&mut short).is_err());
        let mut out = vec![0u8; f.byte_len()];
        f.write(1, 2);
        f.copy_to(&mut out).unwrap();
        assert_eq!(out, f.to_bytes());
    }

    #[test]
    fn signal_coalesces() {
        let s = FrameSignal::new();
        assert!(!s.take());
        s.raise();
        s.raise();
        assert!(s.is_raised());
        assert!(s.take());
        assert!(!s.take());
    }
}
