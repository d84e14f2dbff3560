//! Boundary collaborator abstractions for the spindle SPI driver layer.
//!
//! This crate defines trait-based contracts for the external primitives the
//! driver core builds on: the register-level bus, the data-available digital
//! input, the per-direction interrupt notification capability, and the
//! completion-queue primitive with fixed-buffer registration. The driver
//! never talks to hardware or to the OS directly; everything electrical or
//! kernel-side sits behind these traits.
//!
//! # Design Philosophy
//!
//! - **Async-first**: waiting operations are native `async fn` in traits
//!   (Edition 2024 RPITIT); no `async_trait` macro.
//! - **errno at the boundary**: collaborators report failures as
//!   `std::io::Error`; the driver core maps them into its own error domain.
//! - **Thread-aware**: traits require `Send` (and `Sync` where the edge
//!   context may run concurrently with the owner context).
//! - **Mockable**: every trait has a programmable mock implementation in
//!   [`mock`], paired with a control handle for tests and development.
//!
//! # Mock Implementations
//!
//! ```
//! use spindle_hal::mock::MockSpiBus;
//! use spindle_hal::traits::SpiBus;
//!
//! let (mut bus, handle) = MockSpiBus::new();
//! handle.push_rx(&[0xAA]);
//!
//! let mut byte = [0u8; 1];
//! let n = bus.read_raw(&mut byte).unwrap();
//! assert_eq!((n, byte[0]), (1, 0xAA));
//! ```

pub mod mock;
pub mod traits;

// Re-export commonly used items for convenience
pub use traits::{CompletionRing, DigitalInput, EdgeHandler, ReadinessNotifier, SpiBus};
