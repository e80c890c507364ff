//! Per-tick step planning
//!
//! Two distinct step budgets live here. The *reservation* budget bounds how
//! many pages are prefetched for one request during the reservation phase.
//! The *batch plan* is the single step count every batch member runs in
//! one generator invocation.

use super::batch::ActiveBatch;
use super::context::DecodeContext;
use super::types::{SchedulerError, SchedulerResult};

/// Computes the number of forward-generation steps to run each tick.
#[derive(Debug, Clone)]
pub struct StepPlanner {
    max_forward_steps: usize,
}

impl StepPlanner {
    pub fn new(max_forward_steps: usize) -> Self {
        StepPlanner { max_forward_steps }
    }

    /// The configured per-tick ceiling.
    pub fn max_forward_steps(&self) -> usize {
        self.max_forward_steps
    }

    /// Steps worth reserving cache pages for, for one request: the per-tick
    /// ceiling, clipped to what the cache manager's sequence-length bound
    /// still permits for this sequence.
    pub fn reservation_steps(&self, context: &DecodeContext, max_seq_len: usize) -> usize {
        self.max_forward_steps
            .min(context.num_available_steps(max_seq_len))
    }

    /// The shared step count for the whole batch this tick.
    ///
    /// Any member without a length bound pins the plan at the ceiling.
    /// Otherwise the plan is the *widest* per-member remaining budget — not
    /// the narrowest — clamped by the ceiling. A member with a tighter
    /// budget can therefore be asked to run past its own bound; the
    /// generator clips per-request output at that request's `max_length`.
    pub fn plan(&self, batch: &ActiveBatch) -> SchedulerResult<usize> {
        if batch.is_empty() {
            return Err(SchedulerError::EmptyBatch);
        }

        let mut batch_available: Option<usize> = None;
        for (_, context) in batch.iter() {
            let Some(max_length) = context.max_length() else {
                return Ok(self.max_forward_steps);
            };
            let available = context.num_available_steps(max_length);
            batch_available = Some(match batch_available {
                Some(widest) if widest >= available => widest,
                _ => available,
            });
        }

        match batch_available {
            Some(widest) if widest > 0 && widest < self.max_forward_steps => Ok(widest),
            _ => Ok(self.max_forward_steps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(contexts: Vec<(&str, DecodeContext)>) -> ActiveBatch {
        let mut batch = ActiveBatch::new();
        for (id, ctx) in contexts {
            batch.insert(id.to_string(), ctx);
        }
        batch
    }

    #[test]
    fn test_empty_batch_is_hard_error() {
        let planner = StepPlanner::new(8);
        let err = planner.plan(&ActiveBatch::new()).unwrap_err();
        assert!(matches!(err, SchedulerError::EmptyBatch));
    }

    #[test]
    fn test_unbounded_member_pins_ceiling() {
        let planner = StepPlanner::new(8);
        let batch = batch_of(vec![
            ("r1", DecodeContext::new(10, Some(12))),
            ("r2", DecodeContext::new(10, None)),
        ]);
        assert_eq!(planner.plan(&batch).unwrap(), 8);
    }

    #[test]
    fn test_plan_takes_widest_member_budget() {
        let planner = StepPlanner::new(8);
        // r1 has 2 steps left, r2 has 5. The plan follows the widest.
        let batch = batch_of(vec![
            ("r1", DecodeContext::new(10, Some(12))),
            ("r2", DecodeContext::new(10, Some(15))),
        ]);
        assert_eq!(planner.plan(&batch).unwrap(), 5);
    }

    #[test]
    fn test_plan_never_exceeds_ceiling() {
        let planner = StepPlanner::new(4);
        let batch = batch_of(vec![("r1", DecodeContext::new(10, Some(100)))]);
        assert_eq!(planner.plan(&batch).unwrap(), 4);
    }

    #[test]
    fn test_exhausted_budget_falls_back_to_ceiling() {
        // All members already at their bound: the widest budget is 0, which
        // is not a usable plan, so the ceiling applies.
        let planner = StepPlanner::new(4);
        let batch = batch_of(vec![("r1", DecodeContext::new(10, Some(10)))]);
        assert_eq!(planner.plan(&batch).unwrap(), 4);
    }

    #[test]
    fn test_reservation_steps_clipped_by_cache_bound() {
        let planner = StepPlanner::new(8);
        let ctx = DecodeContext::new(29, None);
        assert_eq!(planner.reservation_steps(&ctx, 32), 3);
        assert_eq!(planner.reservation_steps(&ctx, 1024), 8);
        assert_eq!(planner.reservation_steps(&ctx, 29), 0);
    }
}
