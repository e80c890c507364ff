//! Shared harness for integration tests
//!
//! Wires a scheduler to scripted generator and page-manager stand-ins. The
//! two mocks share a reservation ledger through the same release path the
//! real pipeline uses: the generator's release hook frees the pages a slot
//! held, so eviction and termination both return capacity.

#![allow(dead_code)]

use decodeforge::{
    ActiveBatch, DecodeContext, DecodeQueues, DecodeScheduler, DecodeSchedulerConfig,
    FrontendQueues, GenerationError, PageManager, ProcessHandle, QueueError, RequestId, SlotId,
    StepOutput, StreamDelta, TokenGenerator, TokenId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Pages reserved per cache slot, shared between the mocks.
#[derive(Debug, Default)]
pub struct PageLedger {
    reservations: HashMap<SlotId, usize>,
}

impl PageLedger {
    fn reserved_excluding(&self, slot: SlotId) -> usize {
        self.reservations
            .iter()
            .filter(|(held, _)| **held != slot)
            .map(|(_, tokens)| tokens)
            .sum()
    }
}

pub type SharedLedger = Arc<Mutex<PageLedger>>;

/// Generator stand-in: emits tokens from a monotonic counter, clips each
/// request at its own length bound, and finishes requests that reach it.
pub struct MockGenerator {
    next_token: TokenId,
    ledger: SharedLedger,
    released: Arc<Mutex<Vec<RequestId>>>,
}

impl MockGenerator {
    fn new(ledger: SharedLedger, released: Arc<Mutex<Vec<RequestId>>>) -> Self {
        MockGenerator {
            next_token: 1000,
            ledger,
            released,
        }
    }
}

impl TokenGenerator for MockGenerator {
    fn next_tokens(
        &mut self,
        batch: &mut ActiveBatch,
        num_steps: usize,
    ) -> Result<HashMap<RequestId, StepOutput>, GenerationError> {
        let mut results = HashMap::new();
        for (request_id, context) in batch.iter_mut() {
            let budget = context
                .max_length()
                .map(|bound| bound.saturating_sub(context.seq_len()))
                .unwrap_or(num_steps);
            let produced = num_steps.min(budget);
            let finished = context
                .max_length()
                .is_some_and(|bound| context.seq_len() + produced >= bound);

            let mut tokens = Vec::with_capacity(produced);
            for _ in 0..produced {
                tokens.push(self.next_token);
                self.next_token += 1;
            }
            context.append_tokens(produced);
            results.insert(request_id.clone(), StepOutput { tokens, finished });
        }
        Ok(results)
    }

    fn release(&mut self, request_id: &str, context: &mut DecodeContext) {
        if let Some(slot) = context.cache_slot() {
            self.ledger
                .lock()
                .unwrap()
                .reservations
                .remove(&slot);
        }
        self.released.lock().unwrap().push(request_id.to_string());
    }
}

/// Cache-manager stand-in with a fixed token budget across all slots.
pub struct MockPageManager {
    max_seq_len: usize,
    token_budget: usize,
    ledger: SharedLedger,
}

impl PageManager for MockPageManager {
    fn external_claim(&mut self, slot: SlotId) {
        self.ledger.lock().unwrap().reservations.insert(slot, 0);
    }

    fn prefetch(&mut self, context: &DecodeContext, num_steps: usize) -> bool {
        let Some(slot) = context.cache_slot() else {
            return false;
        };
        let needed = context.seq_len() + num_steps;
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.reserved_excluding(slot) + needed > self.token_budget {
            return false;
        }
        ledger.reservations.insert(slot, needed);
        true
    }

    fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }
}

pub struct Harness {
    pub scheduler: DecodeScheduler<MockGenerator, MockPageManager, ProcessHandle>,
    pub frontend: FrontendQueues,
    pub control: ProcessHandle,
    pub released: Arc<Mutex<Vec<RequestId>>>,
}

impl Harness {
    /// Request ids released by the generator so far, in release order.
    pub fn released_ids(&self) -> Vec<RequestId> {
        self.released.lock().unwrap().clone()
    }
}

pub struct HarnessBuilder {
    config: DecodeSchedulerConfig,
    token_budget: usize,
    max_seq_len: usize,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        HarnessBuilder {
            config: DecodeSchedulerConfig::new()
                .with_max_batch_size(4)
                .with_max_forward_steps(4),
            token_budget: usize::MAX,
            max_seq_len: 4096,
        }
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config = self.config.with_max_batch_size(n);
        self
    }

    pub fn max_forward_steps(mut self, n: usize) -> Self {
        self.config = self.config.with_max_forward_steps(n);
        self
    }

    /// Total tokens the page manager can back at once, across all slots.
    pub fn token_budget(mut self, tokens: usize) -> Self {
        self.token_budget = tokens;
        self
    }

    pub fn max_seq_len(mut self, n: usize) -> Self {
        self.max_seq_len = n;
        self
    }

    pub fn build(self) -> Harness {
        let ledger: SharedLedger = Arc::new(Mutex::new(PageLedger::default()));
        let released = Arc::new(Mutex::new(Vec::new()));
        let (queues, frontend) = DecodeQueues::in_process();
        let control = ProcessHandle::new();
        let scheduler = DecodeScheduler::new(
            self.config,
            MockGenerator::new(Arc::clone(&ledger), Arc::clone(&released)),
            MockPageManager {
                max_seq_len: self.max_seq_len,
                token_budget: self.token_budget,
                ledger,
            },
            control.clone(),
            queues,
        )
        .expect("harness config is valid");
        Harness {
            scheduler,
            frontend,
            control,
            released,
        }
    }
}

/// Enqueue a request straight onto the decode queue, as if prefill already
/// ran it.
pub fn submit_decoded(frontend: &FrontendQueues, id: &str, seq_len: usize, max_length: Option<usize>) {
    frontend
        .decode_tx
        .put_nowait((id.to_string(), DecodeContext::new(seq_len, max_length)))
        .unwrap();
}

/// Per-request view of a drained response stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectedStream {
    pub tokens: Vec<TokenId>,
    pub stopped: bool,
}

/// Drain every frame sequence currently queued downstream and fold it into
/// per-request token streams.
pub fn drain_responses(frontend: &mut FrontendQueues) -> HashMap<RequestId, CollectedStream> {
    let mut collected: HashMap<RequestId, CollectedStream> = HashMap::new();
    loop {
        let frames = match frontend.response_rx.get_nowait() {
            Ok(frames) => frames,
            Err(QueueError::Empty) => break,
            Err(QueueError::Disconnected) => panic!("response queue disconnected"),
        };
        for frame in frames {
            for (request_id, delta) in frame {
                let entry = collected.entry(request_id).or_default();
                assert!(!entry.stopped, "output after stop sentinel");
                match delta {
                    StreamDelta::Token(token) => entry.tokens.push(token),
                    StreamDelta::Stop => entry.stopped = true,
                }
            }
        }
    }
    collected
}
