//! Per-request generation state carried through the decode stage
//!
//! A [`DecodeContext`] is owned by exactly one component at a time: the
//! scheduler while the request is active or preempted, the generator while
//! a forward step is executing. Ownership transfer is by move, so no
//! locking is needed anywhere in the decode stage.

use super::types::{SchedulerError, SchedulerResult, SlotId};

/// Generation state for one request in the decode stage.
///
/// `seq_len` counts every committed token (prompt included). `processed`
/// counts tokens whose KV state is materialized in the cache; it trails
/// `seq_len` only after a preemption reset, which forces the generator to
/// rebuild cache state before producing new tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeContext {
    seq_len: usize,
    processed: usize,
    max_length: Option<usize>,
    cache_slot: Option<SlotId>,
}

impl DecodeContext {
    /// Create a context for a request arriving from the prefill stage.
    ///
    /// The prefill worker has already materialized KV state for the whole
    /// prompt, so `processed` starts equal to `seq_len`.
    pub fn new(seq_len: usize, max_length: Option<usize>) -> Self {
        DecodeContext {
            seq_len,
            processed: seq_len,
            max_length,
            cache_slot: None,
        }
    }

    /// Committed sequence length, prompt included.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Tokens with materialized KV state. Equal to `seq_len` except after
    /// a preemption reset.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// The request's total-length bound, if any. `None` means unbounded.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// The currently held cache slot, if any.
    pub fn cache_slot(&self) -> Option<SlotId> {
        self.cache_slot
    }

    /// Whether this context holds a cache slot.
    pub fn is_assigned_to_cache(&self) -> bool {
        self.cache_slot.is_some()
    }

    /// Assign a cache slot to this context.
    ///
    /// A context holds at most one slot at a time; assigning over an
    /// existing assignment is an invariant violation.
    pub fn assign_slot(&mut self, slot: SlotId) -> SchedulerResult<()> {
        if let Some(held) = self.cache_slot {
            return Err(SchedulerError::SlotAlreadyAssigned { held, new: slot });
        }
        self.cache_slot = Some(slot);
        Ok(())
    }

    /// Give up the held slot, if any, returning it to the caller.
    pub fn take_slot(&mut self) -> Option<SlotId> {
        self.cache_slot.take()
    }

    /// Number of further generation steps before the sequence reaches
    /// `bound` total tokens.
    pub fn num_available_steps(&self, bound: usize) -> usize {
        bound.saturating_sub(self.seq_len)
    }

    /// Record `count` freshly generated tokens as committed and cached.
    pub fn append_tokens(&mut self, count: usize) {
        self.seq_len += count;
        self.processed = self.seq_len;
    }

    /// Reset the generation progress pointer after preemption.
    ///
    /// Committed tokens are kept; the KV state behind them is gone, so the
    /// generator must re-process the whole sequence on re-admission.
    pub fn reset(&mut self) {
        self.processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_fully_processed() {
        let ctx = DecodeContext::new(12, Some(64));
        assert_eq!(ctx.seq_len(), 12);
        assert_eq!(ctx.processed(), 12);
        assert_eq!(ctx.max_length(), Some(64));
        assert!(!ctx.is_assigned_to_cache());
    }

    #[test]
    fn test_slot_assignment_is_exclusive() {
        let mut ctx = DecodeContext::new(4, None);
        ctx.assign_slot(3).unwrap();
        assert_eq!(ctx.cache_slot(), Some(3));

        let err = ctx.assign_slot(5).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::SlotAlreadyAssigned { held: 3, new: 5 }
        ));

        // Releasing clears the assignment and allows a fresh claim.
        assert_eq!(ctx.take_slot(), Some(3));
        assert!(ctx.assign_slot(5).is_ok());
    }

    #[test]
    fn test_num_available_steps() {
        let ctx = DecodeContext::new(10, Some(16));
        assert_eq!(ctx.num_available_steps(16), 6);
        assert_eq!(ctx.num_available_steps(10), 0);
        // Saturates rather than underflowing when already past the bound.
        assert_eq!(ctx.num_available_steps(8), 0);
    }

    #[test]
    fn test_append_and_reset() {
        let mut ctx = DecodeContext::new(10, None);
        ctx.append_tokens(3);
        assert_eq!(ctx.seq_len(), 13);
        assert_eq!(ctx.processed(), 13);

        ctx.reset();
        assert_eq!(ctx.seq_len(), 13);
        assert_eq!(ctx.processed(), 0);

        // Generation after re-admission re-materializes everything.
        ctx.append_tokens(1);
        assert_eq!(ctx.processed(), 14);
    }
}
