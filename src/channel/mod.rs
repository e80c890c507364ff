//! Non-blocking queue endpoints
//!
//! All cross-process coordination is message-passing; every read the
//! scheduler performs is non-blocking with a tri-state outcome: a value,
//! `Empty` (a normal end-of-drain signal, never a fault), or
//! `Disconnected` (a genuine transport fault — the peer endpoint is gone).

use crate::scheduler::{DecodeContext, RequestId, ResponseFrame};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Outcome of a failed queue operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Nothing available right now. Expected; ends a drain loop.
    #[error("queue empty")]
    Empty,
    /// The peer endpoint was dropped. A real transport fault.
    #[error("queue disconnected")]
    Disconnected,
}

/// Receiving endpoint of an in-process queue.
#[derive(Debug)]
pub struct PullQueue<T> {
    receiver: UnboundedReceiver<T>,
}

impl<T> PullQueue<T> {
    /// Pull the next message without blocking.
    pub fn get_nowait(&mut self) -> Result<T, QueueError> {
        self.receiver.try_recv().map_err(|e| match e {
            TryRecvError::Empty => QueueError::Empty,
            TryRecvError::Disconnected => QueueError::Disconnected,
        })
    }
}

/// Sending endpoint of an in-process queue.
#[derive(Debug, Clone)]
pub struct PushQueue<T> {
    sender: UnboundedSender<T>,
}

impl<T> PushQueue<T> {
    /// Push a message without blocking.
    pub fn put_nowait(&self, value: T) -> Result<(), QueueError> {
        self.sender.send(value).map_err(|_| QueueError::Disconnected)
    }
}

/// Create a connected push/pull endpoint pair.
pub fn queue_pair<T>() -> (PushQueue<T>, PullQueue<T>) {
    let (sender, receiver) = unbounded_channel();
    (PushQueue { sender }, PullQueue { receiver })
}

/// The scheduler's five queue endpoints.
pub struct DecodeQueues {
    /// New arrivals from the frontend, bound for the prefill stage.
    pub request_rx: PullQueue<(RequestId, DecodeContext)>,
    /// Outbound requests toward the prefill scheduler.
    pub prefill_tx: PushQueue<(RequestId, DecodeContext)>,
    /// Requests returning from prefill, ready to decode.
    pub decode_rx: PullQueue<(RequestId, DecodeContext)>,
    /// Outbound ordered frame sequences toward the frontend.
    pub response_tx: PushQueue<Vec<ResponseFrame>>,
    /// Cancel notifications. Declared as an endpoint; the control loop does
    /// not consume it.
    pub cancel_rx: PullQueue<(RequestId, DecodeContext)>,
}

/// The far ends of a scheduler's queues, for the frontend and the prefill
/// worker (or a test harness standing in for them).
pub struct FrontendQueues {
    pub request_tx: PushQueue<(RequestId, DecodeContext)>,
    pub prefill_rx: PullQueue<(RequestId, DecodeContext)>,
    pub decode_tx: PushQueue<(RequestId, DecodeContext)>,
    pub response_rx: PullQueue<Vec<ResponseFrame>>,
    pub cancel_tx: PushQueue<(RequestId, DecodeContext)>,
}

impl DecodeQueues {
    /// Create a fully connected in-process queue set, returning the
    /// scheduler's endpoints and the matching far ends.
    pub fn in_process() -> (DecodeQueues, FrontendQueues) {
        let (request_tx, request_rx) = queue_pair();
        let (prefill_tx, prefill_rx) = queue_pair();
        let (decode_tx, decode_rx) = queue_pair();
        let (response_tx, response_rx) = queue_pair();
        let (cancel_tx, cancel_rx) = queue_pair();

        (
            DecodeQueues {
                request_rx,
                prefill_tx,
                decode_rx,
                response_tx,
                cancel_rx,
            },
            FrontendQueues {
                request_tx,
                prefill_rx,
                decode_tx,
                response_rx,
                cancel_tx,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_value() {
        let (tx, mut rx) = queue_pair::<u32>();
        assert_eq!(rx.get_nowait(), Err(QueueError::Empty));
        tx.put_nowait(7).unwrap();
        assert_eq!(rx.get_nowait(), Ok(7));
        assert_eq!(rx.get_nowait(), Err(QueueError::Empty));
    }

    #[test]
    fn test_disconnected_is_distinct_from_empty() {
        let (tx, mut rx) = queue_pair::<u32>();
        tx.put_nowait(1).unwrap();
        drop(tx);
        // Buffered messages drain before the fault surfaces.
        assert_eq!(rx.get_nowait(), Ok(1));
        assert_eq!(rx.get_nowait(), Err(QueueError::Disconnected));
    }

    #[test]
    fn test_push_after_receiver_dropped() {
        let (tx, rx) = queue_pair::<u32>();
        drop(rx);
        assert_eq!(tx.put_nowait(1), Err(QueueError::Disconnected));
    }

    #[test]
    fn test_fifo_order() {
        let (tx, mut rx) = queue_pair::<u32>();
        for i in 0..5 {
            tx.put_nowait(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.get_nowait(), Ok(i));
        }
    }

    #[test]
    fn test_in_process_wiring() {
        let (mut sched, mut frontend) = DecodeQueues::in_process();

        frontend
            .request_tx
            .put_nowait(("r1".to_string(), DecodeContext::new(3, None)))
            .unwrap();
        let (id, _) = sched.request_rx.get_nowait().unwrap();
        assert_eq!(id, "r1");

        sched
            .prefill_tx
            .put_nowait(("r1".to_string(), DecodeContext::new(3, None)))
            .unwrap();
        assert!(frontend.prefill_rx.get_nowait().is_ok());
    }
}
