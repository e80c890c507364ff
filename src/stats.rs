//! Scheduler statistics and monitoring snapshots
//!
//! - [`SchedulerStats`] - monotonic counters accumulated across ticks
//! - [`SchedulerSnapshot`] - point-in-time occupancy for monitoring

use serde::Serialize;

/// Monotonic counters for the scheduler's lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    /// Full control-loop cycles completed.
    pub ticks: u64,
    /// Requests forwarded to the prefill stage.
    pub forwarded: u64,
    /// Requests admitted into the active batch.
    pub admitted: u64,
    /// Requests evicted to the preempted set under capacity pressure.
    pub preemptions: u64,
    /// Requests that terminated normally and were reclaimed.
    pub completed: u64,
    /// Response frames emitted downstream.
    pub frames_emitted: u64,
}

/// Point-in-time occupancy of the scheduler's bookkeeping, for health
/// endpoints and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    /// Requests currently in the active batch.
    pub active_requests: usize,
    /// Requests waiting in the preempted set.
    pub preempted_requests: usize,
    /// Free KV-cache slots.
    pub free_slots: usize,
    /// Total KV-cache slots.
    pub total_slots: usize,
}

impl SchedulerSnapshot {
    /// Whether the pool accounting balances: every claimed slot belongs to
    /// an active request, and free + claimed covers the whole pool.
    pub fn slots_conserved(&self) -> bool {
        self.free_slots + self.active_requests == self.total_slots
    }
}
