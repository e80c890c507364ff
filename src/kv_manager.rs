//! KV-cache manager boundary
//!
//! The paging data structure lives outside the scheduler. The scheduler
//! only registers slot claims and asks for bounded-lookahead page
//! reservations; a refused reservation is the capacity signal that drives
//! preemption, never an error.

use crate::scheduler::{DecodeContext, SlotId};

/// External paged KV-cache manager contract.
///
/// Exactly one scheduler instance issues claims against a given manager
/// instance; the page budget behind it is not otherwise shared.
pub trait PageManager {
    /// Register that `slot` is now owned by a decode request.
    fn external_claim(&mut self, slot: SlotId);

    /// Reserve pages covering `num_steps` further generation steps for this
    /// sequence. Returns `false` when capacity is exhausted.
    fn prefetch(&mut self, context: &DecodeContext, num_steps: usize) -> bool;

    /// Upper bound on any sequence's total length, used to clip per-request
    /// reservation budgets.
    fn max_seq_len(&self) -> usize;
}
