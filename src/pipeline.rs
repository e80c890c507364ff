//! Token generator boundary
//!
//! The scheduler never executes a model itself; it hands the active batch
//! to a [`TokenGenerator`] and interprets the per-request results. The
//! generator owns all model and device state behind this trait.

use crate::scheduler::{ActiveBatch, DecodeContext, RequestId, TokenId};
use std::collections::HashMap;
use thiserror::Error;

/// Failures raised by the external generator during a forward step.
///
/// The scheduler does not isolate per-request faults: a generation failure
/// propagates out of the control loop and is fatal to the scheduler
/// instance.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("batch rejected by generator: {0}")]
    BatchRejected(String),
}

/// Per-request outcome of one batched generation invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    /// Tokens produced this tick, in generation order. May be shorter than
    /// the planned step count when the request terminated early.
    pub tokens: Vec<TokenId>,
    /// Whether the request terminated this tick.
    pub finished: bool,
}

impl StepOutput {
    /// Number of frames this output occupies in the response stream.
    pub fn frame_span(&self) -> usize {
        self.tokens.len() + usize::from(self.finished)
    }
}

/// Model-execution collaborator contract.
pub trait TokenGenerator {
    /// Run up to `num_steps` forward-generation steps over the whole batch.
    ///
    /// The generator appends committed tokens to each context and returns
    /// one [`StepOutput`] per batch member. Output may be shorter than
    /// `num_steps` for requests that terminate early, and must be clipped
    /// to each request's own length bound.
    fn next_tokens(
        &mut self,
        batch: &mut ActiveBatch,
        num_steps: usize,
    ) -> Result<HashMap<RequestId, StepOutput>, GenerationError>;

    /// Release generation state held for a request.
    ///
    /// Called exactly once per request before its cache slot is reused:
    /// on normal termination and on preemption.
    fn release(&mut self, request_id: &str, context: &mut DecodeContext);
}
