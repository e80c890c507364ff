//! Decode scheduler orchestrator and control loop

use super::batch::{ActiveBatch, PreemptedQueue};
use super::context::DecodeContext;
use super::planner::StepPlanner;
use super::slots::CacheSlotPool;
use super::stream::{build_stream, ResponseFrame};
use super::types::{RequestId, SchedulerError, SchedulerResult};
use crate::channel::{DecodeQueues, PullQueue, QueueError};
use crate::config::DecodeSchedulerConfig;
use crate::control::ProcessControl;
use crate::error::DecodeResult;
use crate::kv_manager::PageManager;
use crate::pipeline::{StepOutput, TokenGenerator};
use crate::stats::{SchedulerSnapshot, SchedulerStats};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, info, warn};

/// Decode-stage scheduler.
///
/// Single-threaded and cooperative: all state is owned by this struct and
/// mutated only from [`run`](Self::run). Collaborators are reached through
/// traits and non-blocking queue endpoints, never shared memory.
pub struct DecodeScheduler<G, M, C> {
    config: DecodeSchedulerConfig,
    planner: StepPlanner,
    generator: G,
    page_manager: M,
    control: C,
    queues: DecodeQueues,
    active_batch: ActiveBatch,
    preempted: PreemptedQueue,
    slot_pool: CacheSlotPool,
    stats: SchedulerStats,
}

impl<G, M, C> DecodeScheduler<G, M, C>
where
    G: TokenGenerator,
    M: PageManager,
    C: ProcessControl,
{
    pub fn new(
        config: DecodeSchedulerConfig,
        generator: G,
        page_manager: M,
        control: C,
        queues: DecodeQueues,
    ) -> DecodeResult<Self> {
        config.validate()?;
        let planner = StepPlanner::new(config.max_forward_steps);
        let slot_pool = CacheSlotPool::new(config.max_batch_size);
        Ok(DecodeScheduler {
            config,
            planner,
            generator,
            page_manager,
            control,
            queues,
            active_batch: ActiveBatch::new(),
            preempted: PreemptedQueue::new(),
            slot_pool,
            stats: SchedulerStats::default(),
        })
    }

    /// Accumulated counters.
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Point-in-time occupancy for monitoring.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            active_requests: self.active_batch.len(),
            preempted_requests: self.preempted.len(),
            free_slots: self.slot_pool.free_slots(),
            total_slots: self.slot_pool.capacity(),
        }
    }

    /// The cancel-notification endpoint.
    ///
    /// Declared as part of the scheduler's queue set but not consumed by
    /// the control loop; in-flight requests run to termination.
    pub fn cancel_endpoint(&mut self) -> &mut PullQueue<(RequestId, DecodeContext)> {
        &mut self.queues.cancel_rx
    }

    /// Main scheduling loop.
    ///
    /// Runs until the liveness controller reports cancellation, observed
    /// once per cycle, or until a fatal fault (transport disconnection,
    /// generator failure, violated invariant) propagates out.
    pub fn run(&mut self) -> SchedulerResult<()> {
        info!(
            max_batch_size = self.config.max_batch_size,
            max_forward_steps = self.config.max_forward_steps,
            "decode scheduler started"
        );

        while !self.control.is_cancelled() {
            self.control.beat();
            self.tick()?;
        }

        info!(ticks = self.stats.ticks, "decode scheduler stopped");
        Ok(())
    }

    /// One full scheduling cycle.
    pub fn tick(&mut self) -> SchedulerResult<()> {
        self.forward_to_prefill()?;
        self.fill_batch()?;
        self.reserve_memory()?;

        if self.active_batch.is_empty() {
            self.stats.ticks += 1;
            std::thread::sleep(self.config.idle_backoff);
            return Ok(());
        }

        let num_steps = self.planner.plan(&self.active_batch)?;
        debug!(
            batch_size = self.active_batch.len(),
            num_steps, "dispatching generation step"
        );

        let results = self
            .generator
            .next_tokens(&mut self.active_batch, num_steps)?;

        self.reclaim_terminated(&results)?;
        self.stream_responses(results)?;
        self.stats.ticks += 1;
        Ok(())
    }

    /// Drain the inbound new-request queue, forwarding each request
    /// unmodified to the prefill stage.
    ///
    /// No admission control or memory reservation happens on behalf of
    /// prefill here; eager reservation before forwarding is future work.
    fn forward_to_prefill(&mut self) -> SchedulerResult<()> {
        loop {
            let (request_id, context) = match self.queues.request_rx.get_nowait() {
                Ok(item) => item,
                Err(QueueError::Empty) => return Ok(()),
                Err(fault) => {
                    error!(error = %fault, "new-request queue fault while draining");
                    return Err(SchedulerError::Channel {
                        stage: "forwarding to prefill",
                        source: fault,
                    });
                }
            };

            self.queues
                .prefill_tx
                .put_nowait((request_id, context))
                .map_err(|fault| {
                    error!(error = %fault, "prefill queue fault while forwarding");
                    SchedulerError::Channel {
                        stage: "forwarding to prefill",
                        source: fault,
                    }
                })?;
            self.stats.forwarded += 1;
        }
    }

    /// Next request bound for the active batch, preempted set first.
    fn pull_decode_request(&mut self) -> Result<(RequestId, DecodeContext), QueueError> {
        if let Some(item) = self.preempted.pop() {
            return Ok(item);
        }
        self.queues.decode_rx.get_nowait()
    }

    /// Admit pending and preempted requests while cache slots are free.
    fn fill_batch(&mut self) -> SchedulerResult<()> {
        while self.slot_pool.has_free() {
            let (request_id, mut context) = match self.pull_decode_request() {
                Ok(item) => item,
                Err(QueueError::Empty) => break,
                Err(fault) => {
                    error!(error = %fault, "decode queue fault during admission");
                    return Err(SchedulerError::Channel {
                        stage: "admission",
                        source: fault,
                    });
                }
            };

            if !context.is_assigned_to_cache() {
                // has_free() held above and nothing else claims between.
                let Some(slot) = self.slot_pool.claim() else {
                    break;
                };
                context.assign_slot(slot)?;
                self.page_manager.external_claim(slot);
            }

            debug!(request_id = %request_id, seq_len = context.seq_len(), "admitted to active batch");
            self.active_batch.insert(request_id, context);
            self.stats.admitted += 1;
        }
        Ok(())
    }

    /// Reserve cache pages for every active member, preempting newest-first
    /// under capacity pressure.
    ///
    /// Each failed reservation shrinks the working list by one member, so
    /// the phase completes in at most batch-size eviction attempts.
    fn reserve_memory(&mut self) -> SchedulerResult<()> {
        let mut candidates: VecDeque<RequestId> = self.active_batch.ids_in_order().into();

        while let Some(request_id) = candidates.pop_front() {
            let num_steps = {
                let Some(context) = self.active_batch.get(&request_id) else {
                    continue;
                };
                self.planner
                    .reservation_steps(context, self.page_manager.max_seq_len())
            };

            let reserved = match self.active_batch.get(&request_id) {
                Some(context) => self.page_manager.prefetch(context, num_steps),
                None => continue,
            };
            if reserved {
                continue;
            }

            if candidates.is_empty() {
                // No other candidate to evict: this request itself yields.
                self.evict(&request_id)?;
                break;
            }

            // Evict the most recently admitted remaining candidate and
            // retry the failing one from the front.
            let newest = candidates
                .pop_back()
                .ok_or(SchedulerError::EmptyBatch)?;
            self.evict(&newest)?;
            candidates.push_front(request_id);
        }
        Ok(())
    }

    /// Evict one request from the active batch to the preempted set:
    /// release generator state, return its slot, reset its progress.
    fn evict(&mut self, request_id: &str) -> SchedulerResult<()> {
        let Some(mut context) = self.active_batch.remove(request_id) else {
            return Ok(());
        };

        self.generator.release(request_id, &mut context);
        if let Some(slot) = context.take_slot() {
            self.slot_pool.release(slot)?;
        }
        context.reset();

        warn!(request_id = %request_id, "preempted under capacity pressure");
        self.preempted.push(request_id.to_string(), context);
        self.stats.preemptions += 1;
        Ok(())
    }

    /// Release bookkeeping for every request the generator marked done.
    /// Runs exactly once per terminated request per tick.
    fn reclaim_terminated(
        &mut self,
        results: &HashMap<RequestId, StepOutput>,
    ) -> SchedulerResult<()> {
        for (request_id, output) in results {
            if !output.finished {
                continue;
            }
            let Some(mut context) = self.active_batch.remove(request_id) else {
                continue;
            };

            self.generator.release(request_id, &mut context);
            if let Some(slot) = context.take_slot() {
                self.slot_pool.release(slot)?;
            }

            debug!(request_id = %request_id, seq_len = context.seq_len(), "request terminated");
            self.stats.completed += 1;
        }
        Ok(())
    }

    /// Build the ordered frame sequence and emit it as one message.
    /// Nothing is emitted for an empty result set.
    fn stream_responses(
        &mut self,
        results: HashMap<RequestId, StepOutput>,
    ) -> SchedulerResult<()> {
        if results.is_empty() {
            return Ok(());
        }

        let frames: Vec<ResponseFrame> = build_stream(&results);
        self.stats.frames_emitted += frames.len() as u64;

        self.queues.response_tx.put_nowait(frames).map_err(|fault| {
            error!(error = %fault, "response queue fault while streaming");
            SchedulerError::Channel {
                stage: "streaming responses",
                source: fault,
            }
        })
    }
}
