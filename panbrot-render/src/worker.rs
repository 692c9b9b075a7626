use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use tracing::{debug, trace, warn};

use panbrot_core::{EscapeParams, Progress};

use crate::double_buffer::DoubleBuffer;
use crate::error::RenderError;
use crate::frame::{FrameBuffer, FrameSignal};
use crate::sync::Rendezvous;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything the long-lived workers and the coordinator both touch.
pub(crate) struct Shared {
    pub(crate) buffers: DoubleBuffer,
    pub(crate) frame: FrameBuffer,
    pub(crate) signal: FrameSignal,
    pub(crate) params: EscapeParams,

    /// Pending-index queue: filled by the seed pass, drained and refilled
    /// by workers.
    pub(crate) queue_tx: Sender<usize>,
    pub(crate) queue_rx: Receiver<usize>,

    /// Indices seeded this epoch that have neither escaped nor hit the
    /// ceiling. Zero means the epoch has fully drained.
    pub(crate) outstanding: AtomicUsize,

    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    start_tx: Sender<()>,
    start_rx: Receiver<()>,
    rendezvous: Rendezvous,
    shutdown: AtomicBool,
}

impl Shared {
    pub(crate) fn new(buffers: DoubleBuffer, frame: FrameBuffer, params: EscapeParams) -> Self {
        let (queue_tx, queue_rx) = unbounded();
        let (stop_tx, stop_rx) = unbounded();
        let (start_tx, start_rx) = unbounded();
        Self {
            buffers,
            frame,
            signal: FrameSignal::new(),
            params,
            queue_tx,
            queue_rx,
            outstanding: AtomicUsize::new(0),
            stop_tx,
            stop_rx,
            start_tx,
            start_rx,
            rendezvous: Rendezvous::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    fn settle(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

// ---------------------------------------------------------------------------
// Per-index work
// ---------------------------------------------------------------------------

/// Run one chunk on `index` of the current grid and route the result:
/// re-enqueue, paint and signal, or retire at the ceiling.
pub(crate) fn process(shared: &Shared, index: usize) {
    let mut point = shared.buffers.current().lock(index);
    match point.step(&shared.params) {
        Progress::Pending => {
            drop(point);
            // `Shared` owns the receiver, so this cannot fail.
            let _ = shared.queue_tx.send(index);
        }
        Progress::Escaped => {
            let steps = point.steps;
            drop(point);
            shared.frame.write(index, steps);
            shared.signal.raise();
            shared.settle();
        }
        Progress::Exhausted => {
            drop(point);
            shared.settle();
        }
    }
}

enum Wake {
    Stop,
    Work(usize),
}

fn run(id: usize, shared: Arc<Shared>) {
    debug!(worker = id, "Worker started");
    loop {
        // A pending stop request wins over queued work.
        let wake = match shared.stop_rx.try_recv() {
            Ok(()) => Some(Wake::Stop),
            Err(_) => select! {
                recv(shared.stop_rx) -> msg => msg.ok().map(|()| Wake::Stop),
                recv(shared.queue_rx) -> msg => msg.ok().map(Wake::Work),
            },
        };
        let Some(wake) = wake else {
            break;
        };
        match wake {
            Wake::Stop => {
                if !park(id, &shared) {
                    break;
                }
            }
            Wake::Work(index) => process(&shared, index),
        }
    }
    debug!(worker = id, "Worker exiting");
}

/// Acknowledge a stop request and sleep until released.
///
/// Returns `false` when the worker should exit instead.
fn park(id: usize, shared: &Shared) -> bool {
    if shared.shutdown.load(Ordering::Acquire) {
        return false;
    }
    shared.rendezvous.arrive();
    trace!(worker = id, "Worker parked");
    shared.start_rx.recv().is_ok() && !shared.shutdown.load(Ordering::Acquire)
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Fixed set of worker threads draining the pending-index queue.
pub(crate) struct WorkerPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn spawn(shared: &Arc<Shared>, size: usize) -> crate::Result<Self> {
        let mut pool = Self {
            shared: Arc::clone(shared),
            handles: Vec::with_capacity(size),
        };
        for id in 0..size {
            let shared = Arc::clone(shared);
            let handle = thread::Builder::new()
                .name(format!("panbrot-worker-{id}"))
                .spawn(move || run(id, shared))
                .map_err(RenderError::Spawn)?;
            pool.handles.push(handle);
        }
        Ok(pool)
    }

    pub(crate) fn size(&self) -> usize {
        self.handles.len()
    }

    /// Ask every worker to stop and wait until all of them have parked.
    ///
    /// Each worker finishes the chunk it is on before it notices, so the
    /// wait is bounded by one chunk per worker.
    pub(crate) fn quiesce(&self) {
        for _ in 0..self.size() {
            let _ = self.shared.stop_tx.send(());
        }
        self.shared.rendezvous.wait_for(self.size());
    }

    /// Wake every parked worker.
    pub(crate) fn release(&self) {
        for _ in 0..self.size() {
            let _ = self.shared.start_tx.send(());
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        for _ in 0..self.size() {
            let _ = self.shared.stop_tx.send(());
            let _ = self.shared.start_tx.send(());
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
        debug!("Worker pool shut down");
    }
}
