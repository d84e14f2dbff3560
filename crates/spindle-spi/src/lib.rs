//! Asynchronous serialized access to SPI peripherals.
//!
//! An SPI peripheral cannot service concurrent transactions: this crate
//! wraps one device behind a façade that admits exactly one operation at a
//! time, in arrival order, and runs it against one of two interchangeable
//! transports.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────┐
//!  caller ─ write ──►│                      │     ┌───────────────────┐
//!                    │  SpiDevice           │────►│ CompletionTransport│
//!  caller ─ read ───►│  (fair mutex,        │     │  fixed slots 0/1  │
//!                    │   FIFO admission)    │     └───────────────────┘
//!  caller ─ *_block ►│                      │     ┌───────────────────┐
//!                    │                      │────►│ ChannelTransport  │
//!                    └──────────────────────┘     │  write/read pumps │
//!                                                 └───────────────────┘
//! ```
//!
//! The **completion transport** drives a completion-queue primitive with
//! two pre-registered fixed buffers (slot 0 write, slot 1 read) and gates
//! reads on a broadcast [`readiness::ReadinessSignal`] bound to the
//! device's data-available line.
//!
//! The **channel transport** runs two notification-driven pump tasks, one
//! per direction, exchanging byte frames with callers through FIFO
//! channels.
//!
//! # Examples
//!
//! ```
//! use spindle_core::{SpiConfig, WordLength};
//! use spindle_hal::mock::MockRing;
//! use spindle_spi::SpiDevice;
//!
//! #[tokio::main]
//! async fn main() -> spindle_core::Result<()> {
//!     let (ring, _handle) = MockRing::new();
//!     let config = SpiConfig::new(WordLength::Bits8).with_block_size(64);
//!     let spi = SpiDevice::with_ring(config, ring, None)?;
//!
//!     spi.write_block(|block| block.fill(0xA5)).await?;
//!     spi.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Teardown
//!
//! [`SpiDevice::shutdown`] cancels every suspended caller: readiness
//! waiters and channel waiters alike resolve with
//! [`SpiError::Canceled`]. It then terminates the pump tasks before resources
//! are released. No waiter is ever silently dropped.

pub mod device;
pub mod readiness;
pub mod transport;
pub mod validate;
pub mod waiters;

// Re-export commonly used types for convenience
pub use device::SpiDevice;
pub use spindle_core::{BufferSlot, Result, SpiConfig, SpiError, WordLength};
pub use transport::channel::ChannelTransport;
pub use transport::completion::CompletionTransport;
