use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use panbrot_render::{EngineConfig, Palette};

// ---------------------------------------------------------------------------
// Palette choice
// ---------------------------------------------------------------------------

/// Which color table the engine is built with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaletteChoice {
    #[default]
    Wikipedia,
    /// 256-entry black → red → yellow → white ramp.
    Fire,
    /// Explicit RGBA entries.
    Custom { colors: Vec<[u8; 4]> },
}

impl PaletteChoice {
    pub fn build(&self) -> panbrot_render::Result<Palette> {
        match self {
            Self::Wikipedia => Ok(Palette::wikipedia()),
            Self::Fire => Palette::gradient(
                &[
                    (0.0, [0, 0, 0]),
                    (0.33, [200, 30, 0]),
                    (0.66, [255, 200, 0]),
                    (1.0, [255, 255, 255]),
                ],
                256,
            ),
            Self::Custom { colors } => Palette::new(colors.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub palette: PaletteChoice,
    /// How long the tour waits for each step to converge before taking the
    /// snapshot anyway.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Pan distance of the tour's pan step, in pixels.
    #[serde(default = "default_pan_step_px")]
    pub pan_step_px: i32,
    /// Zoom factor of the tour's zoom-at step.
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,
}

fn default_idle_timeout_secs() -> u64 {
    60
}
fn default_pan_step_px() -> i32 {
    10
}
fn default_zoom_factor() -> f64 {
    0.5
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            palette: PaletteChoice::default(),
            idle_timeout_secs: default_idle_timeout_secs(),
            pan_step_px: default_pan_step_px(),
            zoom_factor: default_zoom_factor(),
        }
    }
}

impl Preferences {
    /// Load preferences from the OS config directory, falling back to
    /// defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<Preferences>(&json) {
                    Ok(prefs) => match prefs.engine.validate() {
                        Ok(()) => {
                            info!("Loaded preferences from {}", path.display());
                            return prefs;
                        }
                        Err(e) => error!("Ignoring invalid engine preferences: {e}"),
                    },
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    /// Persist preferences to disk.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences to {}", path.display());
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }
}

pub fn config_path() -> PathBuf {
    crate::app_dir::config_directory().join("preferences.json")
}
