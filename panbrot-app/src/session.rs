//! Scripted tour: a fixed sequence of view changes, one snapshot per step.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use panbrot_render::{export_engine_png, Engine};

use crate::preferences::Preferences;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Snapshot whatever the engine shows at startup.
    Initial,
    Pan { dx: i32, dy: i32 },
    ZoomAt { factor: f64, px: i32, py: i32 },
    Reset,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Pan { .. } => "pan",
            Self::ZoomAt { .. } => "zoom-at",
            Self::Reset => "reset",
        }
    }

    /// Apply to `engine`. Returns `false` if the engine dropped or
    /// rejected the request.
    fn apply(&self, engine: &Engine) -> bool {
        match *self {
            Self::Initial => true,
            Self::Pan { dx, dy } => engine.pan(dx, dy).is_some(),
            Self::ZoomAt { factor, px, py } => engine.zoom_at(factor, px, py).is_some(),
            Self::Reset => engine.reset().is_some(),
        }
    }
}

/// Initial render, a pan, a zoom into the upper-left quadrant, and a reset.
pub fn tour(prefs: &Preferences) -> Vec<Step> {
    let (w, h) = (prefs.engine.width as i32, prefs.engine.height as i32);
    vec![
        Step::Initial,
        Step::Pan {
            dx: prefs.pan_step_px,
            dy: 0,
        },
        Step::ZoomAt {
            factor: prefs.zoom_factor,
            px: w / 4,
            py: h / 4,
        },
        Step::Reset,
    ]
}

/// Run `steps` against `engine`, writing `NN-label.png` into `out_dir`.
pub fn run(
    engine: &Engine,
    steps: &[Step],
    out_dir: &Path,
    idle_timeout: Duration,
) -> panbrot_render::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        if !step.apply(engine) {
            warn!(step = step.label(), "Step was not applied");
        }

        let started = Instant::now();
        if !engine.wait_idle(idle_timeout) {
            warn!(
                step = step.label(),
                pending = engine.pending(),
                "Timed out waiting for the frame to settle"
            );
        }

        let path = out_dir.join(format!("{:02}-{}.png", i, step.label()));
        export_engine_png(engine, &path)?;
        info!(
            step = step.label(),
            epoch = engine.epoch(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Wrote {}",
            path.display()
        );
        written.push(path);
    }
    Ok(written)
}
