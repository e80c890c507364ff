//! Core types for the decode-stage scheduler

use crate::channel::QueueError;
use crate::pipeline::GenerationError;
use thiserror::Error;

/// Unique identifier of a generation request, assigned by the frontend.
pub type RequestId = String;

/// A single generated token id.
pub type TokenId = u32;

/// Identifier of one KV-cache slot in the decode pool.
pub type SlotId = u32;

/// Errors that can occur during scheduling operations
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Step planning was invoked with nothing in the active batch. This is
    /// a logic fault in the control loop, not a recoverable condition.
    #[error("active batch must contain at least one context to plan a step count")]
    EmptyBatch,

    /// A queue endpoint reported a transport fault (as opposed to being
    /// merely empty, which is never an error).
    #[error("channel fault while {stage}: {source}")]
    Channel {
        stage: &'static str,
        #[source]
        source: QueueError,
    },

    #[error("slot {0} released twice")]
    SlotDoubleRelease(SlotId),

    #[error("slot {0} is outside the pool")]
    SlotOutOfRange(SlotId),

    #[error("context already holds slot {held}, refusing to assign slot {new}")]
    SlotAlreadyAssigned { held: SlotId, new: SlotId },

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
