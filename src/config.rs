//! Scheduler configuration

use crate::error::DecodeForgeError;
use std::time::Duration;

/// Static configuration for the decode-stage scheduler, fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct DecodeSchedulerConfig {
    /// KV-cache slot pool size: the maximum number of requests in the
    /// token-generation batch at once.
    pub max_batch_size: usize,

    /// Upper bound on forward-generation steps per tick, shared by every
    /// batch member.
    pub max_forward_steps: usize,

    /// Sleep applied when a cycle finds nothing to do, bounding the CPU
    /// cost of the busy-polling loop.
    pub idle_backoff: Duration,
}

impl Default for DecodeSchedulerConfig {
    fn default() -> Self {
        DecodeSchedulerConfig {
            max_batch_size: 32,
            max_forward_steps: 8,
            idle_backoff: Duration::from_millis(1),
        }
    }
}

impl DecodeSchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_max_forward_steps(mut self, max_forward_steps: usize) -> Self {
        self.max_forward_steps = max_forward_steps;
        self
    }

    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    /// Validate the configuration before constructing a scheduler.
    pub fn validate(&self) -> Result<(), DecodeForgeError> {
        if self.max_batch_size == 0 {
            return Err(DecodeForgeError::InvalidConfiguration(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_forward_steps == 0 {
            return Err(DecodeForgeError::InvalidConfiguration(
                "max_forward_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
