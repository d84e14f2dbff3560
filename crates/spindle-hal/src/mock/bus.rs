//! Mock register-level bus for testing and development.
//!
//! This module provides a simulated SPI register interface with an inbound
//! byte fifo, a record of outbound frames, and per-direction notification
//! sources. Tests drive it through a `MockSpiBusHandle`: feed receive data,
//! gate transmit capacity, inject faults, or wire the bus into loopback so
//! written bytes come straight back on the receive side.

use crate::traits::{ReadinessNotifier, SpiBus};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Effectively unlimited transmit capacity.
const TX_UNLIMITED: u32 = u32::MAX;

#[derive(Debug)]
struct BusShared {
    inner: Mutex<BusInner>,
    rx_edge: Notify,
    tx_edge: Notify,
}

#[derive(Debug)]
struct BusInner {
    rx: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    tx_space: u32,
    loopback: bool,
    fail_read: Option<io::ErrorKind>,
    fail_write: Option<io::ErrorKind>,
    disconnected: bool,
}

impl BusShared {
    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Mock register-level SPI bus.
///
/// Created together with its control handle; the bus side goes to the
/// driver, the handle side stays with the test.
///
/// # Examples
///
/// ```
/// use spindle_hal::mock::MockSpiBus;
/// use spindle_hal::traits::SpiBus;
///
/// let (mut bus, handle) = MockSpiBus::new();
///
/// bus.write_raw(&[0x01, 0x02]).unwrap();
/// assert_eq!(handle.written(), vec![vec![0x01, 0x02]]);
/// ```
#[derive(Debug)]
pub struct MockSpiBus {
    shared: Arc<BusShared>,
}

impl MockSpiBus {
    /// Create a new mock bus and its control handle.
    pub fn new() -> (Self, MockSpiBusHandle) {
        let shared = Arc::new(BusShared {
            inner: Mutex::new(BusInner {
                rx: VecDeque::new(),
                written: Vec::new(),
                tx_space: TX_UNLIMITED,
                loopback: false,
                fail_read: None,
                fail_write: None,
                disconnected: false,
            }),
            rx_edge: Notify::new(),
            tx_edge: Notify::new(),
        });

        let handle = MockSpiBusHandle {
            shared: Arc::clone(&shared),
        };

        (Self { shared }, handle)
    }
}

impl SpiBus for MockSpiBus {
    fn write_raw(&mut self, frame: &[u8]) -> io::Result<usize> {
        let mut inner = self.shared.lock();
        if let Some(kind) = inner.fail_write.take() {
            return Err(kind.into());
        }
        inner.written.push(frame.to_vec());
        inner.tx_space = inner.tx_space.saturating_sub(1);
        if inner.loopback {
            inner.rx.extend(frame.iter().copied());
            drop(inner);
            self.shared.rx_edge.notify_one();
        }
        Ok(frame.len())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.shared.lock();
        if let Some(kind) = inner.fail_read.take() {
            return Err(kind.into());
        }
        if inner.rx.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let mut read = 0;
        while read < buf.len() {
            match inner.rx.pop_front() {
                Some(byte) => {
                    buf[read] = byte;
                    read += 1;
                }
                None => break,
            }
        }
        Ok(read)
    }
}

/// Handle for controlling a [`MockSpiBus`].
///
/// Can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockSpiBusHandle {
    shared: Arc<BusShared>,
}

impl MockSpiBusHandle {
    /// Feed bytes into the receive fifo and raise the inbound edge.
    pub fn push_rx(&self, bytes: &[u8]) {
        {
            let mut inner = self.shared.lock();
            inner.rx.extend(bytes.iter().copied());
        }
        self.shared.rx_edge.notify_one();
    }

    /// Get a copy of every frame written so far, in write order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.shared.lock().written.clone()
    }

    /// Number of bytes still queued on the receive side.
    pub fn rx_len(&self) -> usize {
        self.shared.lock().rx.len()
    }

    /// Wire written bytes straight back into the receive fifo.
    pub fn enable_loopback(&self) {
        self.shared.lock().loopback = true;
    }

    /// Set the remaining transmit capacity, in frames.
    ///
    /// The capacity is the outbound notifier's pending level; a write pump
    /// stops draining once it reaches zero and resumes on the next raised
    /// outbound edge.
    pub fn set_tx_space(&self, frames: u32) {
        self.shared.lock().tx_space = frames;
    }

    /// Raise the outbound notification edge.
    pub fn raise_tx(&self) {
        self.shared.tx_edge.notify_one();
    }

    /// Raise the inbound notification edge without feeding data.
    pub fn raise_rx(&self) {
        self.shared.rx_edge.notify_one();
    }

    /// Make the next raw write fail with the given error kind.
    pub fn fail_next_write(&self, kind: io::ErrorKind) {
        self.shared.lock().fail_write = Some(kind);
    }

    /// Make the next raw read fail with the given error kind.
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.shared.lock().fail_read = Some(kind);
    }

    /// Tear down both notification sources.
    ///
    /// Pending and future [`MockBusNotifier::edge`] waits resolve with an
    /// error, the way a closed notification primitive reports itself.
    pub fn disconnect(&self) {
        self.shared.lock().disconnected = true;
        self.shared.rx_edge.notify_one();
        self.shared.tx_edge.notify_one();
    }

    /// Notifier bound to the inbound (data available) direction.
    pub fn rx_notifier(&self) -> MockBusNotifier {
        MockBusNotifier {
            shared: Arc::clone(&self.shared),
            direction: Direction::Rx,
        }
    }

    /// Notifier bound to the outbound (transmit capacity) direction.
    pub fn tx_notifier(&self) -> MockBusNotifier {
        MockBusNotifier {
            shared: Arc::clone(&self.shared),
            direction: Direction::Tx,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Rx,
    Tx,
}

/// Notification source for one direction of a [`MockSpiBus`].
///
/// The inbound pending level is the receive fifo depth; the outbound
/// pending level is the remaining transmit capacity.
#[derive(Debug)]
pub struct MockBusNotifier {
    shared: Arc<BusShared>,
    direction: Direction,
}

impl ReadinessNotifier for MockBusNotifier {
    fn pending(&self) -> u32 {
        let inner = self.shared.lock();
        match self.direction {
            Direction::Rx => inner.rx.len() as u32,
            Direction::Tx => inner.tx_space,
        }
    }

    async fn edge(&mut self) -> io::Result<()> {
        if self.shared.lock().disconnected {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        match self.direction {
            Direction::Rx => self.shared.rx_edge.notified().await,
            Direction::Tx => self.shared.tx_edge.notified().await,
        }
        if self.shared.lock().disconnected {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_bus_records_writes() {
        let (mut bus, handle) = MockSpiBus::new();

        bus.write_raw(&[1, 2, 3]).unwrap();
        bus.write_raw(&[4]).unwrap();

        assert_eq!(handle.written(), vec![vec![1, 2, 3], vec![4]]);
    }

    #[test]
    fn test_mock_bus_read_from_fifo() {
        let (mut bus, handle) = MockSpiBus::new();
        handle.push_rx(&[0xDE, 0xAD]);

        let mut buf = [0u8; 1];
        assert_eq!(bus.read_raw(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0xDE);
        assert_eq!(handle.rx_len(), 1);
    }

    #[test]
    fn test_mock_bus_read_empty_fifo() {
        let (mut bus, _handle) = MockSpiBus::new();

        let mut buf = [0u8; 4];
        let err = bus.read_raw(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_mock_bus_loopback() {
        let (mut bus, handle) = MockSpiBus::new();
        handle.enable_loopback();

        bus.write_raw(&[7, 8]).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(bus.read_raw(&mut buf).unwrap(), 2);
        assert_eq!(buf, [7, 8]);
    }

    #[test]
    fn test_mock_bus_fault_injection() {
        let (mut bus, handle) = MockSpiBus::new();

        handle.fail_next_write(io::ErrorKind::BrokenPipe);
        assert_eq!(
            bus.write_raw(&[0]).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
        // The fault is one-shot.
        bus.write_raw(&[0]).unwrap();

        handle.push_rx(&[1]);
        handle.fail_next_read(io::ErrorKind::TimedOut);
        let mut buf = [0u8; 1];
        assert_eq!(
            bus.read_raw(&mut buf).unwrap_err().kind(),
            io::ErrorKind::TimedOut
        );
        bus.read_raw(&mut buf).unwrap();
    }

    #[tokio::test]
    async fn test_rx_notifier_pending_tracks_fifo() {
        let (mut bus, handle) = MockSpiBus::new();
        let notifier = handle.rx_notifier();

        assert_eq!(notifier.pending(), 0);
        handle.push_rx(&[1, 2, 3]);
        assert_eq!(notifier.pending(), 3);

        let mut buf = [0u8; 3];
        bus.read_raw(&mut buf).unwrap();
        assert_eq!(notifier.pending(), 0);
    }

    #[tokio::test]
    async fn test_rx_notifier_edge_on_push() {
        let (_bus, handle) = MockSpiBus::new();
        let mut notifier = handle.rx_notifier();

        handle.push_rx(&[9]);
        notifier.edge().await.unwrap();
    }

    #[tokio::test]
    async fn test_notifier_disconnect() {
        let (_bus, handle) = MockSpiBus::new();
        let mut notifier = handle.rx_notifier();

        handle.disconnect();
        assert!(notifier.edge().await.is_err());
    }
}
