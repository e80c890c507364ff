//! Process liveness and cooperative cancellation
//!
//! The scheduler checks for cancellation once at the top of every cycle and
//! emits a heartbeat so a supervisor can tell a busy loop from a hung one.
//! Cancellation is cooperative: an in-progress tick always completes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Liveness collaborator contract.
pub trait ProcessControl {
    /// Whether the scheduler has been asked to stop.
    fn is_cancelled(&self) -> bool;

    /// Signal that the scheduler is alive and making progress.
    fn beat(&self);
}

/// Shared in-process liveness handle.
///
/// Clone one half into the scheduler and keep the other with the
/// supervisor; `cancel()` takes effect at the top of the next cycle.
#[derive(Debug, Clone, Default)]
pub struct ProcessHandle {
    inner: Arc<HandleState>,
}

#[derive(Debug, Default)]
struct HandleState {
    cancelled: AtomicBool,
    beats: AtomicU64,
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cooperative shutdown.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Number of heartbeats observed so far.
    pub fn beat_count(&self) -> u64 {
        self.inner.beats.load(Ordering::Acquire)
    }
}

impl ProcessControl for ProcessHandle {
    fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    fn beat(&self) {
        self.inner.beats.fetch_add(1, Ordering::AcqRel);
    }
}
