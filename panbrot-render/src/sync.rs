//! Scheduler primitives shared by the coordinator and the worker pool.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// Capacity-one token guarding the start of an epoch.
///
/// Acquisition never blocks: a caller that finds the token taken simply
/// does not start an epoch.
#[derive(Debug, Default)]
pub struct Permit {
    held: AtomicBool,
}

impl Permit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<PermitGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| PermitGuard { permit: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Returns the permit when dropped.
#[derive(Debug)]
pub struct PermitGuard<'a> {
    permit: &'a Permit,
}

impl Drop for PermitGuard<'_> {
    fn drop(&mut self) {
        self.permit.held.store(false, Ordering::Release);
    }
}

/// Counting barrier: workers check in one at a time, the coordinator waits
/// until a given number have.
#[derive(Debug, Default)]
pub struct Rendezvous {
    arrived: Mutex<usize>,
    all_arrived: Condvar,
}

impl Rendezvous {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arrive(&self) {
        let mut arrived = self.arrived.lock();
        *arrived += 1;
        self.all_arrived.notify_all();
    }

    /// Block until `expected` arrivals are recorded, then consume them.
    pub fn wait_for(&self, expected: usize) {
        let mut arrived = self.arrived.lock();
        while *arrived < expected {
            self.all_arrived.wait(&mut arrived);
        }
        *arrived -= expected;
    }
}
