use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, trace};

use panbrot_core::{FractalMode, Viewport};

use crate::double_buffer::{EpochKind, Overlap, Transition};
use crate::sync::{Permit, PermitGuard};
use crate::worker::{Shared, WorkerPool};

// ---------------------------------------------------------------------------
// State and reports
// ---------------------------------------------------------------------------

/// Where the coordinator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochState {
    /// No work queued; the last epoch has fully drained.
    Idle,
    /// Stop tokens sent, waiting for every worker to park.
    Cancelling,
    /// Workers parked, grid transition in progress.
    Seeding,
    /// Workers released and draining the queue.
    Running,
}

/// What one epoch did while seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochReport {
    pub epoch: u64,
    pub kind: EpochKind,
    /// Cells carried over from the previous grid.
    pub copied: usize,
    /// Cells seeded from the new geometry.
    pub seeded: usize,
    /// Indices placed on the pending queue.
    pub enqueued: usize,
    /// Time from the start of cancellation to worker release.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct SeedTally {
    copied: usize,
    seeded: usize,
    enqueued: usize,
}

impl Add for SeedTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            copied: self.copied + rhs.copied,
            seeded: self.seeded + rhs.seeded,
            enqueued: self.enqueued + rhs.enqueued,
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the worker pool and runs epochs against it, one at a time.
pub(crate) struct EpochCoordinator {
    shared: Arc<Shared>,
    pool: WorkerPool,
    seeder: rayon::ThreadPool,
    permit: Permit,
    epoch: AtomicU64,
    state: Mutex<EpochState>,
}

impl EpochCoordinator {
    /// Spawn `workers` long-lived workers plus a seeding pool of the same
    /// width. No epoch is started.
    pub(crate) fn new(shared: Arc<Shared>, workers: usize) -> crate::Result<Self> {
        let seeder = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("panbrot-seeder-{i}"))
            .build()?;
        let pool = WorkerPool::spawn(&shared, workers)?;
        Ok(Self {
            shared,
            pool,
            seeder,
            permit: Permit::new(),
            epoch: AtomicU64::new(0),
            state: Mutex::new(EpochState::Idle),
        })
    }

    /// Take the single-flight permit if nobody holds it.
    pub(crate) fn try_begin(&self) -> Option<EpochTicket<'_>> {
        let guard = self.permit.try_acquire()?;
        Some(EpochTicket {
            coordinator: self,
            _guard: guard,
        })
    }

    pub(crate) fn state(&self) -> EpochState {
        match *self.state.lock() {
            EpochState::Running if self.pending() == 0 => EpochState::Idle,
            state => state,
        }
    }

    /// Number of the most recently started epoch.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Seeded indices that have neither escaped nor reached the ceiling.
    pub(crate) fn pending(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    pub(crate) fn workers(&self) -> usize {
        self.pool.size()
    }

    fn set_state(&self, state: EpochState) {
        *self.state.lock() = state;
    }

    fn run(
        &self,
        viewport: &Viewport,
        mode: &FractalMode,
        transition: Transition,
    ) -> EpochReport {
        let started = Instant::now();
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let kind = transition.kind();
        let shared = &*self.shared;

        self.set_state(EpochState::Cancelling);
        debug!(epoch, ?kind, "Cancelling in-flight work");
        self.pool.quiesce();

        self.set_state(EpochState::Seeding);
        let stale = shared.queue_rx.try_iter().count();
        shared.outstanding.store(0, Ordering::Release);
        trace!(epoch, stale, "Drained pending queue");

        if transition.flips() {
            shared.buffers.flip();
        }
        let overlap = match transition {
            Transition::Shift { dx, dy } => {
                Overlap::new(dx, dy, viewport.width(), viewport.height())
            }
            Transition::Reload | Transition::Rescale => None,
        };

        let lanes = self.seeder.current_num_threads().max(1);
        let tally = self.seeder.install(|| {
            (0..lanes)
                .into_par_iter()
                .map(|lane| seed_lane(shared, lane, lanes, viewport, mode, overlap.as_ref()))
                .reduce(SeedTally::default, |a, b| a + b)
        });

        shared.outstanding.store(tally.enqueued, Ordering::Release);
        shared.signal.raise();
        self.set_state(EpochState::Running);
        self.pool.release();

        let elapsed = started.elapsed();
        debug!(
            epoch,
            ?kind,
            copied = tally.copied,
            seeded = tally.seeded,
            enqueued = tally.enqueued,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Epoch seeded"
        );

        EpochReport {
            epoch,
            kind,
            copied: tally.copied,
            seeded: tally.seeded,
            enqueued: tally.enqueued,
            elapsed,
        }
    }
}

/// Prepare rows `lane, lane + lanes, ...` of the current grid, paint their
/// initial colors and queue the cells that still need iterating.
fn seed_lane(
    shared: &Shared,
    lane: usize,
    lanes: usize,
    viewport: &Viewport,
    mode: &FractalMode,
    overlap: Option<&Overlap>,
) -> SeedTally {
    let mut tally = SeedTally::default();
    let height = viewport.height() as usize;
    for row in (lane..height).step_by(lanes) {
        let mut enqueued = 0;
        let rows = shared
            .buffers
            .prepare_row(row as u32, viewport, mode, overlap, |index, point| {
                if point.finished {
                    shared.frame.write(index, point.steps);
                } else {
                    shared.frame.clear(index);
                }
                if point.needs_work(&shared.params) {
                    // `Shared` owns the receiver, so this cannot fail.
                    let _ = shared.queue_tx.send(index);
                    enqueued += 1;
                }
            });
        tally = tally
            + SeedTally {
                copied: rows.copied,
                seeded: rows.seeded,
                enqueued,
            };
    }
    tally
}

/// Proof that the caller holds the permit. Dropping it without running
/// gives the permit back.
pub(crate) struct EpochTicket<'a> {
    coordinator: &'a EpochCoordinator,
    _guard: PermitGuard<'a>,
}

impl EpochTicket<'_> {
    /// Cancel, transition, seed and release. The permit is returned when
    /// this finishes.
    pub(crate) fn run(
        self,
        viewport: &Viewport,
        mode: &FractalMode,
        transition: Transition,
    ) -> EpochReport {
        self.coordinator.run(viewport, mode, transition)
    }
}
