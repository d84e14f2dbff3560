//! Broadcast wait on the peripheral's data-available line.
//!
//! The completion transport must not submit a read before the peripheral
//! reports data; [`ReadinessSignal`] turns the edge-triggered digital input
//! into an awaitable condition. Callers that find the line low suspend into
//! a FIFO [`WaiterQueue`]; a rising edge releases the **whole** cohort at
//! once. Broadcast is deliberate: every consumer re-validates device state
//! after resuming, so waking everyone is safe and no wakeup is lost under
//! bursty edges.
//!
//! The edge handler runs in the interrupt-handling context, concurrently
//! with the logical owner; all signal state sits under one `std::sync`
//! mutex taken by both sides, and the level check shares a critical
//! section with the enqueue so no edge can fall between them.
//!
//! [`WaiterQueue`]: crate::waiters::WaiterQueue

use crate::waiters::WaiterQueue;
use spindle_core::{Result, SpiError};
use spindle_hal::traits::DigitalInput;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Ready,
    Canceled,
}

struct SignalState {
    waiters: WaiterQueue<WaitOutcome>,
    closed: bool,
}

/// Awaitable data-available condition over an edge-triggered input.
pub struct ReadinessSignal {
    input: Arc<dyn DigitalInput>,
    state: Mutex<SignalState>,
}

impl ReadinessSignal {
    /// Wrap an input and subscribe to its rising edge.
    ///
    /// The subscription holds only a weak reference: once the last strong
    /// reference drops, later edges are ignored.
    pub fn new(input: Arc<dyn DigitalInput>) -> Arc<Self> {
        let signal = Arc::new(Self {
            input: Arc::clone(&input),
            state: Mutex::new(SignalState {
                waiters: WaiterQueue::new(),
                closed: false,
            }),
        });

        let weak: Weak<ReadinessSignal> = Arc::downgrade(&signal);
        input.subscribe_rising(Box::new(move || {
            if let Some(signal) = weak.upgrade() {
                signal.edge();
            }
        }));

        signal
    }

    /// Wait until the line reads asserted.
    ///
    /// Returns immediately when the line is already high; otherwise the
    /// caller suspends until the next rising edge that finds the line high,
    /// or until [`close`] cancels the wait.
    ///
    /// # Errors
    ///
    /// Returns `SpiError::Canceled` when the signal is closed before or
    /// while waiting.
    ///
    /// [`close`]: ReadinessSignal::close
    pub async fn available(&self) -> Result<()> {
        let waiter = {
            let mut state = self.lock_state();
            if state.closed {
                return Err(SpiError::Canceled);
            }
            if self.input.is_asserted() {
                return Ok(());
            }
            state.waiters.enqueue()
        };

        match waiter.await {
            Ok(WaitOutcome::Ready) => Ok(()),
            Ok(WaitOutcome::Canceled) | Err(_) => Err(SpiError::Canceled),
        }
    }

    /// Number of callers currently suspended on the line.
    pub fn waiting(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Resolve every remaining waiter with a cancellation outcome.
    ///
    /// Subsequent [`available`] calls fail immediately. Idempotent.
    ///
    /// [`available`]: ReadinessSignal::available
    pub fn close(&self) {
        let mut state = self.lock_state();
        if state.closed {
            return;
        }
        state.closed = true;
        let canceled = state.waiters.resolve_all(WaitOutcome::Canceled);
        if canceled > 0 {
            debug!(canceled, "canceled pending readiness waiters");
        }
    }

    /// Rising-edge entry point, called from the interrupt-handling context.
    fn edge(&self) {
        let mut state = self.lock_state();
        if state.closed || !self.input.is_asserted() {
            return;
        }
        let released = state.waiters.resolve_all(WaitOutcome::Ready);
        if released > 0 {
            trace!(released, "readiness edge released waiting readers");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_hal::mock::MockDigitalInput;
    use std::time::Duration;
    use tokio::time::timeout;

    fn signal() -> (Arc<ReadinessSignal>, spindle_hal::mock::MockDigitalInputHandle) {
        let (input, handle) = MockDigitalInput::new();
        (ReadinessSignal::new(Arc::new(input)), handle)
    }

    #[tokio::test]
    async fn test_available_immediate_when_asserted() {
        let (signal, handle) = signal();
        handle.set_asserted(true);

        signal.available().await.unwrap();
        assert_eq!(signal.waiting(), 0);
    }

    #[tokio::test]
    async fn test_available_suspends_until_edge() {
        let (signal, handle) = signal();

        let waiter = tokio::spawn({
            let signal = Arc::clone(&signal);
            async move { signal.available().await }
        });

        // The caller must be parked, not resolved.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(signal.waiting(), 1);

        handle.raise();
        timeout(Duration::from_millis(100), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_edge_broadcasts_to_all_waiters() {
        let (signal, handle) = signal();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let signal = Arc::clone(&signal);
            waiters.push(tokio::spawn(async move { signal.available().await }));
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(signal.waiting(), 3);

        handle.raise();

        for waiter in waiters {
            timeout(Duration::from_millis(100), waiter)
                .await
                .unwrap()
                .unwrap()
                .unwrap();
        }
        assert_eq!(signal.waiting(), 0);
    }

    #[tokio::test]
    async fn test_edge_with_low_line_is_ignored() {
        let (signal, handle) = signal();

        let waiter = tokio::spawn({
            let signal = Arc::clone(&signal);
            async move { signal.available().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.fire_edge();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(signal.waiting(), 1);

        handle.raise();
        timeout(Duration::from_millis(100), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_cancels_waiters() {
        let (signal, _handle) = signal();

        let waiter = tokio::spawn({
            let signal = Arc::clone(&signal);
            async move { signal.available().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.close();

        let result = timeout(Duration::from_millis(100), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(SpiError::Canceled)));
    }

    #[tokio::test]
    async fn test_available_after_close() {
        let (signal, handle) = signal();
        handle.set_asserted(true);
        signal.close();

        assert!(matches!(signal.available().await, Err(SpiError::Canceled)));
    }

    #[tokio::test]
    async fn test_edge_after_drop_is_ignored() {
        let (input, handle) = MockDigitalInput::new();
        let signal = ReadinessSignal::new(Arc::new(input));
        drop(signal);

        // Must not panic even though the signal is gone.
        handle.raise();
    }
}
