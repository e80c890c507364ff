//! Unified error handling for DecodeForge
//!
//! Module-specific errors stay close to their modules; this type
//! consolidates them for callers that drive the scheduler as a whole and
//! attaches a coarse category for triage.

use crate::channel::QueueError;
use crate::logging::LoggingError;
use crate::pipeline::GenerationError;
use crate::scheduler::SchedulerError;

/// Unified error type for DecodeForge
#[derive(Debug, thiserror::Error)]
pub enum DecodeForgeError {
    /// Scheduling-phase failure (invariant violations, slot accounting,
    /// channel faults observed by the control loop)
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Queue transport fault outside the scheduler's phases
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Failure from the external token generator
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Logging initialization failure
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Invalid static configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Coarse error categories for triage and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Message transport faults
    Transport,
    /// Bugs and violated invariants inside the scheduler
    Internal,
    /// External generator failures
    Generation,
    /// Configuration and setup problems
    Configuration,
}

impl DecodeForgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DecodeForgeError::Scheduler(SchedulerError::Channel { .. }) => {
                ErrorCategory::Transport
            }
            DecodeForgeError::Scheduler(SchedulerError::Generation(_)) => {
                ErrorCategory::Generation
            }
            DecodeForgeError::Scheduler(_) => ErrorCategory::Internal,
            DecodeForgeError::Queue(_) => ErrorCategory::Transport,
            DecodeForgeError::Generation(_) => ErrorCategory::Generation,
            DecodeForgeError::Logging(_) => ErrorCategory::Configuration,
            DecodeForgeError::InvalidConfiguration(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether retrying the operation could plausibly succeed.
    ///
    /// Internal invariant violations and configuration errors never
    /// recover; a disconnected in-process queue means the peer is gone.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Generation)
    }
}

/// Result type for operations spanning the whole crate
pub type DecodeResult<T> = Result<T, DecodeForgeError>;
