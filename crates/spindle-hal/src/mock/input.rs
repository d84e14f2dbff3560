//! Mock digital input for testing and development.
//!
//! This module provides a simulated edge-triggered input line. Tests drive
//! the line level and fire rising edges through a `MockDigitalInputHandle`,
//! from whatever task they like; the handlers run right in the caller's
//! context, standing in for the interrupt context of real hardware.

use crate::traits::{DigitalInput, EdgeHandler};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

struct InputShared {
    asserted: AtomicBool,
    handlers: Mutex<Vec<EdgeHandler>>,
}

impl InputShared {
    fn fire_handlers(&self) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handler in handlers.iter() {
            handler();
        }
    }
}

/// Mock edge-triggered digital input.
///
/// Created together with its control handle; the input side goes to the
/// driver (usually as `Arc<dyn DigitalInput>`), the handle side stays with
/// the test.
///
/// # Examples
///
/// ```
/// use spindle_hal::mock::MockDigitalInput;
/// use spindle_hal::traits::DigitalInput;
///
/// let (input, handle) = MockDigitalInput::new();
/// assert!(!input.is_asserted());
///
/// handle.raise();
/// assert!(input.is_asserted());
/// ```
pub struct MockDigitalInput {
    shared: Arc<InputShared>,
}

impl MockDigitalInput {
    /// Create a new mock input, initially unasserted, and its handle.
    pub fn new() -> (Self, MockDigitalInputHandle) {
        let shared = Arc::new(InputShared {
            asserted: AtomicBool::new(false),
            handlers: Mutex::new(Vec::new()),
        });

        let handle = MockDigitalInputHandle {
            shared: Arc::clone(&shared),
        };

        (Self { shared }, handle)
    }
}

impl DigitalInput for MockDigitalInput {
    fn is_asserted(&self) -> bool {
        self.shared.asserted.load(Ordering::SeqCst)
    }

    fn subscribe_rising(&self, handler: EdgeHandler) {
        self.shared
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handler);
    }
}

/// Handle for controlling a [`MockDigitalInput`].
///
/// Can be cloned and shared across tasks.
#[derive(Clone)]
pub struct MockDigitalInputHandle {
    shared: Arc<InputShared>,
}

impl MockDigitalInputHandle {
    /// Drive the line high and fire every subscribed rising-edge handler.
    pub fn raise(&self) {
        self.shared.asserted.store(true, Ordering::SeqCst);
        self.shared.fire_handlers();
    }

    /// Set the line level without firing an edge.
    pub fn set_asserted(&self, asserted: bool) {
        self.shared.asserted.store(asserted, Ordering::SeqCst);
    }

    /// Fire the rising-edge handlers at the current line level.
    ///
    /// A real line can glitch: the edge fires but the level already dropped
    /// by the time it is read back. This simulates that.
    pub fn fire_edge(&self) {
        self.shared.fire_handlers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_mock_input_level() {
        let (input, handle) = MockDigitalInput::new();

        assert!(!input.is_asserted());
        handle.set_asserted(true);
        assert!(input.is_asserted());
        handle.set_asserted(false);
        assert!(!input.is_asserted());
    }

    #[test]
    fn test_mock_input_raise_fires_handlers() {
        let (input, handle) = MockDigitalInput::new();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        input.subscribe_rising(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        handle.raise();
        handle.raise();

        assert!(input.is_asserted());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mock_input_fire_edge_keeps_level() {
        let (input, handle) = MockDigitalInput::new();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        input.subscribe_rising(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        handle.fire_edge();

        assert!(!input.is_asserted());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mock_input_multiple_subscribers() {
        let (input, handle) = MockDigitalInput::new();

        let fired = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            input.subscribe_rising(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        handle.raise();
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }
}
