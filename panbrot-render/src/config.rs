use serde::{Deserialize, Serialize};

use panbrot_core::{Complex, EscapeParams, FractalMode, Viewport};

use crate::error::RenderError;
use crate::palette::PaletteMode;

/// Everything an [`Engine`](crate::Engine) needs besides its palette.
///
/// Every field has a default, so a JSON file only has to mention what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Raster width in pixels; must be even.
    pub width: u32,
    /// Raster height in pixels; must be even.
    pub height: u32,

    /// Viewport centre restored by `reset`.
    pub initial_center: Complex,
    /// Horizontal half-extent restored by `reset`.
    pub initial_half_width: f64,
    /// Zooms that would shrink the half width below this are refused.
    pub min_half_width: f64,

    pub escape: EscapeParams,

    /// Worker threads; `None` uses one per logical core.
    pub workers: Option<usize>,

    pub palette_mode: PaletteMode,

    /// Seed mode and seed value restored by `reset_all`.
    pub mode: FractalMode,
}

impl EngineConfig {
    pub const DEFAULT_WIDTH: u32 = 1440;
    pub const DEFAULT_HEIGHT: u32 = 1440;
    pub const DEFAULT_CENTER: Complex = Complex::new(-0.75, 0.0);
    pub const DEFAULT_HALF_WIDTH: f64 = 1.25;
    pub const DEFAULT_MIN_HALF_WIDTH: f64 = 1.25e-13;

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.escape.validate()?;
        self.initial_viewport()?;
        if self.min_half_width <= 0.0 || !self.min_half_width.is_finite() {
            return Err(RenderError::InvalidConfig {
                reason: format!(
                    "min_half_width must be positive and finite, got {}",
                    self.min_half_width
                ),
            });
        }
        if self.initial_half_width < self.min_half_width {
            return Err(RenderError::InvalidConfig {
                reason: format!(
                    "initial_half_width {} is below min_half_width {}",
                    self.initial_half_width, self.min_half_width
                ),
            });
        }
        if self.workers == Some(0) {
            return Err(RenderError::InvalidConfig {
                reason: "workers must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The viewport `reset` returns to.
    pub fn initial_viewport(&self) -> crate::Result<Viewport> {
        Ok(Viewport::new(
            self.initial_center,
            self.initial_half_width,
            self.width,
            self.height,
        )?)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Same config with a different raster size.
    pub fn with_raster(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            initial_center: Self::DEFAULT_CENTER,
            initial_half_width: Self::DEFAULT_HALF_WIDTH,
            min_half_width: Self::DEFAULT_MIN_HALF_WIDTH,
            escape: EscapeParams::default(),
            workers: None,
            palette_mode: PaletteMode::default(),
            mode: FractalMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = EngineConfig::default();
        c.validate().unwrap();
        assert_eq!(c.escape.chunk_size, 1024);
        assert_eq!(c.escape.max_steps, 8192);
        assert!(c.worker_count() >= 1);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let c = EngineConfig::from_json_str(
            r#"{
                "width": 320,
                "height": 240,
                "escape": { "max_steps": 2048 },
                "palette_mode": "clamped",
                "mode": { "kind": "julia", "c": { "re": -0.8, "im": 0.156 } }
            }"#,
        )
        .unwrap();
        assert_eq!((c.width, c.height), (320, 240));
        assert_eq!(c.escape.max_steps, 2048);
        assert_eq!(c.escape.chunk_size, 1024);
        assert!((c.escape.escape_radius_sq() - 4.0).abs() < f64::EPSILON);
        assert_eq!(c.palette_mode, PaletteMode::Clamped);
        assert_eq!(c.mode, FractalMode::julia(Complex::new(-0.8, 0.156)));
        assert_eq!(c.initial_center, EngineConfig::DEFAULT_CENTER);
    }

    #[test]
    fn json_round_trip() {
        let c = EngineConfig::default().with_raster(64, 48);
        let back = EngineConfig::from_json_str(&c.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let odd = EngineConfig::default().with_raster(101, 100);
        assert!(matches!(odd.validate(), Err(RenderError::Core(_))));

        let no_workers = EngineConfig {
            workers: Some(0),
            ..EngineConfig::default()
        };
        assert!(matches!(no_workers.validate(), Err(RenderError::InvalidConfig { .. })));

        let clamp_too_big = EngineConfig {
            min_half_width: 10.0,
            ..EngineConfig::default()
        };
        assert!(clamp_too_big.validate().is_err());

        assert!(EngineConfig::from_json_str(r#"{ "escape": { "chunk_size": 0 } }"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }
}
