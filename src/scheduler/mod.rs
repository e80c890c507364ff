//! Decode-stage continuous batching scheduler
//!
//! This module owns the per-tick control loop: admit requests into the
//! active batch while cache slots are free, reserve pages with
//! newest-first preemption under capacity pressure, plan a shared step
//! count, dispatch generation, reclaim terminated requests, and build the
//! ordered response stream.

mod batch;
mod context;
mod planner;
#[allow(clippy::module_inception)]
mod scheduler;
mod slots;
mod stream;
mod types;

pub use batch::{ActiveBatch, PreemptedQueue};
pub use context::DecodeContext;
pub use planner::StepPlanner;
pub use scheduler::DecodeScheduler;
pub use slots::CacheSlotPool;
pub use stream::{build_stream, ResponseFrame, StreamDelta};
pub use types::{RequestId, SchedulerError, SchedulerResult, SlotId, TokenId};
