//! Collaborator trait definitions.
//!
//! These traits establish the contract between the driver core and the
//! platform: a register-level bus, an edge-triggered digital input, a
//! per-direction readiness notification capability, and a completion-queue
//! primitive supporting pre-registered fixed buffers. Real implementations
//! wrap the platform's devices; the [`crate::mock`] module provides
//! programmable substitutes for development and testing.
//!
//! Waiting operations use native `async fn` methods (Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use spindle_core::BufferSlot;
use std::io;

/// Callback invoked from the interrupt-handling context on a rising edge.
///
/// The handler may run concurrently with the logical owner of the device;
/// implementations of [`DigitalInput`] make no ordering guarantee beyond
/// "at some point after the edge".
pub type EdgeHandler = Box<dyn Fn() + Send + Sync>;

/// Register-level SPI bus access.
///
/// One raw call moves bytes through the peripheral's data register with no
/// queueing or retry; partial acceptance is reported through the returned
/// byte count. The notification-driven transport's pump loops are the only
/// callers.
pub trait SpiBus: Send {
    /// Write `frame` to the data register.
    ///
    /// Returns the number of bytes the peripheral accepted.
    fn write_raw(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes from the data register.
    ///
    /// Returns the number of bytes actually read.
    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Edge-triggered digital input carrying the peripheral's data-available
/// line.
///
/// # Object Safety and Dynamic Dispatch
///
/// Unlike the async traits in this module, `DigitalInput` is object-safe:
/// both operations are synchronous, so the driver stores the input as
/// `Arc<dyn DigitalInput>` and shares it with the edge context.
pub trait DigitalInput: Send + Sync {
    /// Read the current line level.
    fn is_asserted(&self) -> bool;

    /// Register a handler invoked on every rising edge.
    ///
    /// The handler runs in the interrupt-handling context and must not
    /// block. Implementations keep the handler registered for the life of
    /// the input.
    fn subscribe_rising(&self, handler: EdgeHandler);
}

/// Per-direction readiness notification capability.
///
/// Hides the platform's notification primitive behind two operations: query
/// the current pending level and suspend until the next edge. One notifier
/// instance serves exactly one pump loop, which owns it for the life of the
/// transport.
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods
/// return `impl Future` (Edition 2024 RPITIT). Pump loops take the notifier
/// as a generic parameter instead of a trait object.
pub trait ReadinessNotifier: Send {
    /// Current pending level of the notification source.
    ///
    /// For an inbound notifier this is the amount of unserviced data; for
    /// an outbound notifier, the remaining transmit capacity.
    fn pending(&self) -> u32;

    /// Suspend until the next notification edge.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying primitive has been torn down;
    /// the owning pump loop terminates in response.
    fn edge(&mut self) -> impl std::future::Future<Output = io::Result<()>> + Send;
}

/// Completion-queue primitive with fixed-buffer support.
///
/// Models an asynchronous submit/complete I/O mechanism: submissions return
/// once the corresponding completion arrives, carrying the completed byte
/// count. Buffers registered through [`register_buffers`] are reused across
/// transfers without copying; slot-suffixed submissions must be handed the
/// registered buffer region for that slot.
///
/// **NOTE**: This trait is NOT object-safe (Edition 2024 RPITIT); the
/// completion transport and its device façade are generic over it.
///
/// [`register_buffers`]: CompletionRing::register_buffers
pub trait CompletionRing: Send {
    /// Register the two fixed buffers: slot 0 for writes sized `write_len`,
    /// slot 1 for reads sized `read_len`.
    ///
    /// # Errors
    ///
    /// Fails if buffers are already registered or the primitive rejects
    /// the registration.
    fn register_buffers(&mut self, write_len: usize, read_len: usize) -> io::Result<()>;

    /// Submit a plain write of `data` and await its completion.
    async fn submit_write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Submit a plain read into `buf` and await its completion.
    async fn submit_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Submit a write from the registered buffer for `slot`.
    async fn submit_write_fixed(&mut self, slot: BufferSlot, buf: &[u8]) -> io::Result<usize>;

    /// Submit a read into the registered buffer for `slot`.
    async fn submit_read_fixed(&mut self, slot: BufferSlot, buf: &mut [u8]) -> io::Result<usize>;

    /// Submit a full-duplex transfer reusing the registered buffer for
    /// `slot`: the buffer's contents are written out and the simultaneous
    /// inbound bytes replace them in place.
    async fn submit_transfer_fixed(&mut self, slot: BufferSlot, buf: &mut [u8])
    -> io::Result<usize>;
}
