//! Active batch registry and preempted-request holding area
//!
//! The active batch needs both "iterate in admission order" (the reservation
//! phase walks oldest-first) and "remove by key" (reclamation and eviction),
//! so it keeps an order vector next to the lookup map.

use super::context::DecodeContext;
use super::types::RequestId;
use std::collections::{HashMap, VecDeque};

/// Insertion-ordered collection of requests currently scheduled for
/// generation. Order reflects admission sequence, oldest first.
#[derive(Debug, Default)]
pub struct ActiveBatch {
    order: Vec<RequestId>,
    contexts: HashMap<RequestId, DecodeContext>,
}

impl ActiveBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a request at the tail of the admission order.
    ///
    /// Re-inserting an existing id replaces its context but keeps its
    /// original position, mirroring ordered-map semantics.
    pub fn insert(&mut self, request_id: RequestId, context: DecodeContext) {
        if self.contexts.insert(request_id.clone(), context).is_none() {
            self.order.push(request_id);
        }
    }

    /// Remove a request by id, returning its context.
    pub fn remove(&mut self, request_id: &str) -> Option<DecodeContext> {
        let context = self.contexts.remove(request_id)?;
        self.order.retain(|id| id != request_id);
        Some(context)
    }

    pub fn get(&self, request_id: &str) -> Option<&DecodeContext> {
        self.contexts.get(request_id)
    }

    pub fn get_mut(&mut self, request_id: &str) -> Option<&mut DecodeContext> {
        self.contexts.get_mut(request_id)
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.contexts.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Request ids in admission order, oldest first.
    pub fn ids_in_order(&self) -> Vec<RequestId> {
        self.order.clone()
    }

    /// Iterate contexts in admission order.
    pub fn iter(&self) -> impl Iterator<Item = (&RequestId, &DecodeContext)> {
        self.order
            .iter()
            .filter_map(|id| self.contexts.get_key_value(id))
    }

    /// Iterate contexts mutably. Order is unspecified; mutation never
    /// changes admission order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&RequestId, &mut DecodeContext)> {
        self.contexts.iter_mut()
    }
}

/// First-in-first-out holding area for requests evicted from the active
/// batch. Drained with strict priority over the inbound decode queue when
/// the batch is refilled, so preempted requests never starve behind new
/// arrivals.
#[derive(Debug, Default)]
pub struct PreemptedQueue {
    queue: VecDeque<(RequestId, DecodeContext)>,
}

impl PreemptedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request_id: RequestId, context: DecodeContext) {
        self.queue.push_back((request_id, context));
    }

    pub fn pop(&mut self) -> Option<(RequestId, DecodeContext)> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
