//! PNG snapshot export with embedded view metadata (tEXt chunks).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use panbrot_core::{FractalMode, Viewport};

use crate::engine::Engine;
use crate::error::RenderError;

/// Metadata embedded in an exported PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMetadata {
    pub viewport: Viewport,
    pub mode: FractalMode,
    pub max_steps: u32,
    pub escape_radius: f64,
    /// Epoch the frame was taken from.
    pub epoch: u64,
}

impl SnapshotMetadata {
    /// Describe what `engine` is showing right now.
    pub fn from_engine(engine: &Engine) -> Self {
        Self {
            viewport: engine.viewport(),
            mode: engine.mode(),
            max_steps: engine.config().escape.max_steps,
            escape_radius: engine.config().escape.escape_radius,
            epoch: engine.epoch(),
        }
    }

    fn description(&self) -> String {
        format!(
            "{} - Center: {}, Half width: {:e}, Seed: {}, Ceiling: {}",
            self.mode.label(),
            self.viewport.center,
            self.viewport.half_width(),
            self.mode.seed_value(),
            self.max_steps,
        )
    }

    fn pairs(&self) -> Vec<(String, String)> {
        let c = self.viewport.center;
        let seed = self.mode.seed_value();
        vec![
            ("PanBrot.Mode".into(), self.mode.label().into()),
            ("PanBrot.CenterRe".into(), c.re.to_string()),
            ("PanBrot.CenterIm".into(), c.im.to_string()),
            ("PanBrot.HalfWidth".into(), self.viewport.half_width().to_string()),
            ("PanBrot.SeedRe".into(), seed.re.to_string()),
            ("PanBrot.SeedIm".into(), seed.im.to_string()),
            ("PanBrot.MaxSteps".into(), self.max_steps.to_string()),
            ("PanBrot.EscapeRadius".into(), self.escape_radius.to_string()),
            ("PanBrot.Epoch".into(), self.epoch.to_string()),
            (
                "PanBrot.Resolution".into(),
                format!("{}x{}", self.viewport.width(), self.viewport.height()),
            ),
        ]
    }
}

/// Write an RGBA frame as a PNG file with view metadata.
pub fn export_png(
    pixels: &[u8],
    width: u32,
    height: u32,
    path: &Path,
    metadata: &SnapshotMetadata,
) -> crate::Result<()> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(RenderError::FrameSize {
            expected,
            actual: pixels.len(),
        });
    }

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "PanBrot".to_string())?;
    encoder.add_text_chunk("Description".to_string(), metadata.description())?;
    for (key, value) in metadata.pairs() {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(pixels)?;
    png_writer.finish()?;

    debug!(width, height, path = %path.display(), "Exported PNG");
    Ok(())
}

/// Snapshot `engine`'s current frame to `path`.
pub fn export_engine_png(engine: &Engine, path: &Path) -> crate::Result<()> {
    let metadata = SnapshotMetadata::from_engine(engine);
    export_png(
        &engine.frame_bytes(),
        engine.width(),
        engine.height(),
        path,
        &metadata,
    )
}
