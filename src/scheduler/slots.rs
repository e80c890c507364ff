//! Fixed-capacity KV-cache slot pool
//!
//! The pool is the decode stage's hard memory ceiling: one slot per
//! concurrently decoding request. Slots are plain identifiers; the pages
//! behind them belong to the external cache manager.

use super::types::{SchedulerError, SchedulerResult, SlotId};
use std::collections::VecDeque;

/// Fixed-size set of cache-slot identifiers, partitioned into free and
/// claimed. Claim and release are O(1); a claimed bitmap catches
/// double-release bugs instead of silently corrupting the free list.
#[derive(Debug)]
pub struct CacheSlotPool {
    free: VecDeque<SlotId>,
    claimed: Vec<bool>,
}

impl CacheSlotPool {
    /// Create a pool with slots `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        CacheSlotPool {
            free: (0..capacity as SlotId).collect(),
            claimed: vec![false; capacity],
        }
    }

    /// Total number of slots (free + claimed) in the pool.
    pub fn capacity(&self) -> usize {
        self.claimed.len()
    }

    /// Number of currently unclaimed slots.
    pub fn free_slots(&self) -> usize {
        self.free.len()
    }

    /// Number of currently claimed slots.
    pub fn claimed_slots(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Whether at least one slot is free.
    pub fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    /// Claim a free slot, or `None` when the pool is exhausted.
    pub fn claim(&mut self) -> Option<SlotId> {
        let slot = self.free.pop_front()?;
        self.claimed[slot as usize] = true;
        Some(slot)
    }

    /// Return a claimed slot to the free set.
    pub fn release(&mut self, slot: SlotId) -> SchedulerResult<()> {
        let idx = slot as usize;
        if idx >= self.claimed.len() {
            return Err(SchedulerError::SlotOutOfRange(slot));
        }
        if !self.claimed[idx] {
            return Err(SchedulerError::SlotDoubleRelease(slot));
        }
        self.claimed[idx] = false;
        self.free.push_back(slot);
        Ok(())
    }

    /// Whether the given slot is currently marked claimed.
    pub fn is_claimed(&self, slot: SlotId) -> bool {
        self.claimed.get(slot as usize).copied().unwrap_or(false)
    }
}
