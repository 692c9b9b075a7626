use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// How an iteration count past the end of the table picks a color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    /// `palette[steps % len]`
    #[default]
    Cyclic,
    /// `palette[min(steps, len - 1)]`
    Clamped,
}

/// An ordered table of RGBA colors indexed by iteration count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
}

impl Palette {
    pub fn new(colors: Vec<[u8; 4]>) -> crate::Result<Self> {
        if colors.is_empty() {
            return Err(RenderError::EmptyPalette);
        }
        Ok(Self { colors })
    }

    /// Build from a flat `r, g, b, a, r, g, b, a, …` byte table.
    pub fn from_rgba_bytes(bytes: &[u8]) -> crate::Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(RenderError::RaggedPalette(bytes.len()));
        }
        Self::new(
            bytes
                .chunks_exact(4)
                .map(|px| [px[0], px[1], px[2], px[3]])
                .collect(),
        )
    }

    /// The 16-step blue/orange ramp popularised by the Wikipedia renders.
    pub fn wikipedia() -> Self {
        Self {
            colors: vec![
                [9, 1, 47, 255],
                [4, 4, 73, 255],
                [0, 7, 100, 255],
                [12, 44, 138, 255],
                [24, 82, 177, 255],
                [57, 125, 209, 255],
                [134, 181, 229, 255],
                [211, 236, 248, 255],
                [241, 233, 191, 255],
                [248, 201, 95, 255],
                [255, 170, 0, 255],
                [204, 128, 0, 255],
                [153, 87, 0, 255],
                [106, 52, 3, 255],
                [66, 30, 15, 255],
                [25, 7, 26, 255],
            ],
        }
    }

    /// Build a `size`-entry table by interpolating between `(position, rgb)`
    /// stops, positions in `[0, 1]` and ascending.
    pub fn gradient(stops: &[(f64, [u8; 3])], size: usize) -> crate::Result<Self> {
        if stops.is_empty() || size == 0 {
            return Err(RenderError::EmptyPalette);
        }
        let colors = (0..size)
            .map(|i| {
                let t = i as f64 / size as f64;
                let lo = stops.iter().rposition(|&(pos, _)| pos <= t).unwrap_or(0);
                let hi = (lo + 1).min(stops.len() - 1);
                let (lo_t, lo_c) = stops[lo];
                let (hi_t, hi_c) = stops[hi];
                let frac = if (hi_t - lo_t).abs() < 1e-10 {
                    0.0
                } else {
                    ((t - lo_t) / (hi_t - lo_t)).clamp(0.0, 1.0)
                };
                lerp(lo_c, hi_c, frac)
            })
            .collect();
        Self::new(colors)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// Color for a point that has consumed `steps` iterations.
    #[inline]
    pub fn color(&self, steps: u32, mode: PaletteMode) -> [u8; 4] {
        let idx = match mode {
            PaletteMode::Cyclic => steps as usize % self.colors.len(),
            PaletteMode::Clamped => (steps as usize).min(self.colors.len() - 1),
        };
        self.colors[idx]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::wikipedia()
    }
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 4] {
    let inv = 1.0 - t;
    [
        (a[0] as f64 * inv + b[0] as f64 * t) as u8,
        (a[1] as f64 * inv + b[1] as f64 * t) as u8,
        (a[2] as f64 * inv + b[2] as f64 * t) as u8,
        255,
    ]
}
