//! Driver-level constants.
//!
//! Centralized limits shared by the transports and the device façade.

/// Capacity of each channel-transport frame queue, in frames.
///
/// The queues are unbounded in practice; the bound exists so a runaway
/// producer suspends instead of growing the heap without limit.
pub const CHANNEL_CAPACITY: usize = 256;

/// Smallest accepted fixed-buffer block size, in bytes.
pub const MIN_BLOCK_SIZE: usize = 1;

/// Largest register-level transfer unit: one 32-bit word.
pub const MAX_WORD_BYTES: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_capacity_nonzero() {
        assert!(CHANNEL_CAPACITY > 0);
    }

    #[test]
    fn test_word_bytes_covers_granularities() {
        assert!(MAX_WORD_BYTES >= 4);
    }
}
