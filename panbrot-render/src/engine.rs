//! Public facade: one raster, its viewport, and the machinery that keeps
//! its pixels converging while the viewport moves.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use panbrot_core::{Complex, FractalMode, Point, Viewport};

use crate::config::EngineConfig;
use crate::coordinator::{EpochCoordinator, EpochReport, EpochState};
use crate::double_buffer::{DoubleBuffer, Transition};
use crate::frame::FrameBuffer;
use crate::palette::Palette;
use crate::worker::Shared;

const IDLE_POLL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy)]
struct ViewState {
    viewport: Viewport,
    mode: FractalMode,
}

/// An incrementally rendered escape-time raster.
///
/// Every mutation (`pan`, `zoom`, `zoom_at`, `reset`, `reset_all`,
/// `reload`, `set_seed`) is best-effort: if an epoch is already being
/// prepared the request is dropped and `None` is returned. None of them
/// wait for the image to converge.
pub struct Engine {
    config: EngineConfig,
    initial: Viewport,
    view: Mutex<ViewState>,
    shared: Arc<Shared>,
    coordinator: EpochCoordinator,
}

impl Engine {
    /// Validate `config`, start the workers and run the first epoch.
    pub fn new(config: EngineConfig, palette: Palette) -> crate::Result<Self> {
        config.validate()?;
        let initial = config.initial_viewport()?;
        let workers = config.worker_count();

        let shared = Arc::new(Shared::new(
            DoubleBuffer::new(config.width, config.height),
            FrameBuffer::new(config.width, config.height, palette, config.palette_mode),
            config.escape,
        ));
        let coordinator = EpochCoordinator::new(Arc::clone(&shared), workers)?;

        let engine = Self {
            view: Mutex::new(ViewState {
                viewport: initial,
                mode: config.mode,
            }),
            initial,
            shared,
            coordinator,
            config,
        };

        info!(
            width = engine.config.width,
            height = engine.config.height,
            workers,
            mode = engine.config.mode.label(),
            max_steps = engine.config.escape.max_steps,
            "Engine started"
        );
        engine.request(Transition::Reload, |_| true);
        Ok(engine)
    }

    // -- Mutations ----------------------------------------------------------

    /// Translate the view by whole pixels. Positive `dx` moves the content
    /// right; positive `dy` moves it down.
    pub fn pan(&self, dx: i32, dy: i32) -> Option<EpochReport> {
        if dx == 0 && dy == 0 {
            return None;
        }
        self.request(Transition::Shift { dx, dy }, |view| {
            view.viewport = view.viewport.panned(dx, dy);
            true
        })
    }

    /// Scale the extent about the centre. Factors below 1 zoom in.
    pub fn zoom(&self, factor: f64) -> Option<EpochReport> {
        let min = self.config.min_half_width;
        self.request(Transition::Rescale, |view| {
            match view.viewport.zoomed(factor, min) {
                Some(viewport) => {
                    view.viewport = viewport;
                    true
                }
                None => false,
            }
        })
    }

    /// Scale the extent while keeping the plane point under `(px, py)`
    /// fixed on screen.
    pub fn zoom_at(&self, factor: f64, px: i32, py: i32) -> Option<EpochReport> {
        let min = self.config.min_half_width;
        self.request(Transition::Rescale, |view| {
            match view.viewport.zoomed_at(factor, px, py, min) {
                Some(viewport) => {
                    view.viewport = viewport;
                    true
                }
                None => false,
            }
        })
    }

    /// Back to the configured centre and extent. The seed is kept.
    pub fn reset(&self) -> Option<EpochReport> {
        let initial = self.initial;
        self.request(Transition::Rescale, |view| {
            view.viewport = initial;
            true
        })
    }

    /// Back to the configured centre, extent and seed.
    pub fn reset_all(&self) -> Option<EpochReport> {
        let initial = self.initial;
        let mode = self.config.mode;
        self.request(Transition::Rescale, |view| {
            view.viewport = initial;
            view.mode = mode;
            true
        })
    }

    /// Reseed every cell with the current geometry.
    pub fn reload(&self) -> Option<EpochReport> {
        self.request(Transition::Reload, |_| true)
    }

    /// Replace the seed (`z0` for Mandelbrot, `c` for Julia) and reload.
    pub fn set_seed(&self, seed: Complex) -> Option<EpochReport> {
        self.request(Transition::Reload, |view| {
            view.mode = view.mode.with_seed(seed);
            true
        })
    }

    /// Switch between Mandelbrot and Julia seeding and reload.
    pub fn set_mode(&self, mode: FractalMode) -> Option<EpochReport> {
        self.request(Transition::Reload, |view| {
            view.mode = mode;
            true
        })
    }

    /// Take the permit, apply `update` to the view and run the epoch.
    ///
    /// `update` returning `false` rejects the request with the view left
    /// untouched. The permit is taken first so that a dropped request
    /// never changes the view.
    fn request(
        &self,
        transition: Transition,
        update: impl FnOnce(&mut ViewState) -> bool,
    ) -> Option<EpochReport> {
        let Some(ticket) = self.coordinator.try_begin() else {
            trace!(?transition, "Request dropped: epoch in preparation");
            return None;
        };

        let (viewport, mode) = {
            let mut view = self.view.lock();
            let mut next = *view;
            if !update(&mut next) {
                debug!(?transition, "Request rejected");
                return None;
            }
            *view = next;
            (next.viewport, next.mode)
        };

        Some(ticket.run(&viewport, &mode, transition))
    }

    // -- Frame access -------------------------------------------------------

    /// Test-and-clear the "frame changed" signal.
    pub fn poll_frame(&self) -> bool {
        self.shared.signal.take()
    }

    /// Copy of the RGBA frame, `width × height × 4` bytes.
    pub fn frame_bytes(&self) -> Vec<u8> {
        self.shared.frame.to_bytes()
    }

    /// Copy the RGBA frame into a caller-owned buffer.
    pub fn copy_frame(&self, out: &mut [u8]) -> crate::Result<()> {
        self.shared.frame.copy_to(out)
    }

    // -- Queries ------------------------------------------------------------

    pub fn viewport(&self) -> Viewport {
        self.view.lock().viewport
    }

    pub fn mode(&self) -> FractalMode {
        self.view.lock().mode
    }

    /// Copy of the current grid's point at `(col, row)`, or `None` outside
    /// the raster.
    pub fn point(&self, col: u32, row: u32) -> Option<Point> {
        if col >= self.config.width || row >= self.config.height {
            return None;
        }
        let grid = self.shared.buffers.current();
        Some(grid.get(grid.index(col, row)))
    }

    /// Indices of the current epoch still being iterated.
    pub fn pending(&self) -> usize {
        self.coordinator.pending()
    }

    pub fn state(&self) -> EpochState {
        self.coordinator.state()
    }

    /// Number of the most recent epoch; the initial render is epoch 1.
    pub fn epoch(&self) -> u64 {
        self.coordinator.epoch()
    }

    pub fn workers(&self) -> usize {
        self.coordinator.workers()
    }

    /// Block the calling thread until the current epoch has drained or
    /// `timeout` elapses. Returns whether it drained.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state() == EpochState::Idle {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(IDLE_POLL);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        self.shared.frame.palette()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        info!(epochs = self.coordinator.epoch(), "Engine shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(workers: usize) -> Engine {
        let config = EngineConfig {
            workers: Some(workers),
            ..EngineConfig::default().with_raster(32, 24)
        };
        Engine::new(config, Palette::wikipedia()).unwrap()
    }

    #[test]
    fn new_runs_the_first_epoch() {
        let engine = small(2);
        assert_eq!(engine.epoch(), 1);
        assert_eq!(engine.workers(), 2);
        assert!(engine.poll_frame());
        assert!(engine.wait_idle(Duration::from_secs(30)));
        assert_eq!(engine.pending(), 0);
        assert_eq!(engine.frame_bytes().len(), 32 * 24 * 4);
    }

    #[test]
    fn zero_pan_starts_no_epoch() {
        let engine = small(2);
        assert!(engine.pan(0, 0).is_none());
        assert_eq!(engine.epoch(), 1);
    }

    #[test]
    fn rejected_zoom_leaves_view_alone() {
        let engine = small(1);
        let before = engine.viewport();
        assert!(engine.zoom(0.0).is_none());
        assert!(engine.zoom(-1.0).is_none());
        assert!(engine.zoom(1e-20).is_none());
        assert_eq!(engine.viewport(), before);
        assert_eq!(engine.epoch(), 1);
    }

    #[test]
    fn point_outside_raster_is_none() {
        let engine = small(1);
        assert!(engine.point(32, 0).is_none());
        assert!(engine.point(0, 24).is_none());
        assert!(engine.point(31, 23).is_some());
    }

    #[test]
    fn copy_frame_checks_length() {
        let engine = small(1);
        let mut short = vec![0u8; 10];
        assert!(engine.copy_frame(&mut short).is_err());
        let mut full = vec![0u8; 32 * 24 * 4];
        engine.copy_frame(&mut full).unwrap();
    }
}
