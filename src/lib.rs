//! DecodeForge - Decode-Stage Scheduler
//!
//! A continuous batching scheduler for the decode stage of a disaggregated
//! LLM serving pipeline. It admits token-generation requests into a shared
//! batch under a fixed pool of KV-cache slots, preempts under capacity
//! pressure, and streams ordered per-step output frames downstream.

pub mod channel;
pub mod config;
pub mod control;
pub mod error;
pub mod kv_manager;
pub mod logging;
pub mod pipeline;
pub mod scheduler;
pub mod stats;

pub use channel::{DecodeQueues, FrontendQueues, PullQueue, PushQueue, QueueError};
pub use config::DecodeSchedulerConfig;
pub use control::{ProcessControl, ProcessHandle};
pub use error::{DecodeForgeError, DecodeResult, ErrorCategory};
pub use kv_manager::PageManager;
pub use pipeline::{GenerationError, StepOutput, TokenGenerator};
pub use scheduler::{
    ActiveBatch, CacheSlotPool, DecodeContext, DecodeScheduler, PreemptedQueue, RequestId,
    ResponseFrame, SchedulerError, SlotId, StepPlanner, StreamDelta, TokenId,
};
pub use stats::{SchedulerSnapshot, SchedulerStats};
