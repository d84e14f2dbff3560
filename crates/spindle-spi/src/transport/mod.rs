//! The two low-level transport strategies.
//!
//! Both transports implement the same logical contract, moving bytes to
//! and from one SPI peripheral, over different primitives:
//!
//! - [`completion`]: zero-copy submissions through a completion-queue
//!   primitive with two pre-registered fixed buffers.
//! - [`channel`]: notification-driven pump loops exchanging byte frames
//!   with callers through FIFO channels.
//!
//! A transport performs no serialization of its own; the owning
//! [`SpiDevice`](crate::device::SpiDevice) guarantees at most one operation
//! touches a transport at any instant.

pub mod channel;
pub mod completion;

use spindle_core::{Result, SpiError};

/// Check a completed byte count against the requested length.
pub(crate) fn ensure_complete(requested: usize, completed: usize) -> Result<()> {
    if completed == requested {
        Ok(())
    } else {
        Err(SpiError::short_transfer(requested, completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_complete() {
        ensure_complete(4, 4).unwrap();
        assert!(matches!(
            ensure_complete(4, 3),
            Err(SpiError::ShortTransfer {
                requested: 4,
                completed: 3,
            })
        ));
    }
}
