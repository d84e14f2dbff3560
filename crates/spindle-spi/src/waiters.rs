//! FIFO queue of suspended operations.
//!
//! A waiter is the sending half of a oneshot channel; the suspended caller
//! holds the receiving half. The queue is not internally synchronized: the
//! owning component guards it so that enqueue (caller context) and
//! broadcast (edge context) never race.

use std::collections::VecDeque;
use tokio::sync::oneshot;

/// FIFO sequence of suspended-operation records.
///
/// Enqueue and dequeue are O(1) amortized. Every waiter is resolved exactly
/// once: either through [`resolve_all`] or implicitly when the queue is
/// dropped, which resolves the receiving half with a closed-channel error.
///
/// [`resolve_all`]: WaiterQueue::resolve_all
#[derive(Debug)]
pub struct WaiterQueue<T> {
    queue: VecDeque<oneshot::Sender<T>>,
}

impl<T> WaiterQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Append a new waiter and return the receiving half to suspend on.
    pub fn enqueue(&mut self) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.queue.push_back(tx);
        rx
    }

    /// Number of suspended waiters.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no waiter is suspended.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Resolve every queued waiter with `outcome`, in FIFO order.
    ///
    /// Returns the number of waiters that were still listening. Waiters
    /// whose receiving half was dropped are skipped, not counted.
    pub fn resolve_all(&mut self, outcome: T) -> usize
    where
        T: Clone,
    {
        let mut resolved = 0;
        while let Some(waiter) = self.queue.pop_front() {
            if waiter.send(outcome.clone()).is_ok() {
                resolved += 1;
            }
        }
        resolved
    }
}

impl<T> Default for WaiterQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
