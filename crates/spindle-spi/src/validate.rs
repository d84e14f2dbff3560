//! Transfer-length validation.
//!
//! Both transports resolve and check lengths through these functions before
//! any transport machinery is touched; a validation failure never reaches
//! the peripheral.
//!
//! # Examples
//!
//! ```
//! use spindle_spi::validate::effective_len;
//!
//! // Absent count resolves to the buffer capacity.
//! assert_eq!(effective_len(8, None).unwrap(), 8);
//!
//! // Explicit count must fit the buffer.
//! assert_eq!(effective_len(8, Some(5)).unwrap(), 5);
//! assert!(effective_len(8, Some(9)).is_err());
//! ```

use spindle_core::{Result, SpiError, WordLength};

/// Resolve a requested transfer length against a buffer's capacity.
///
/// # Errors
///
/// Returns `SpiError::InvalidArgument` if `count` exceeds `capacity`.
pub fn effective_len(capacity: usize, count: Option<usize>) -> Result<usize> {
    match count {
        Some(count) if count > capacity => Err(SpiError::invalid_argument(format!(
            "Count {} exceeds buffer capacity {}",
            count, capacity
        ))),
        Some(count) => Ok(count),
        None => Ok(capacity),
    }
}

/// Check a transfer length against the word granularity.
///
/// 32-bit devices move four bytes per word, so every transfer length must
/// be a multiple of four; 8- and 16-bit devices accept any length.
///
/// # Errors
///
/// Returns `SpiError::InvalidArgument` on a misaligned length.
pub fn check_alignment(word_length: WordLength, len: usize) -> Result<()> {
    let granularity = word_length.granularity();
    if len % granularity != 0 {
        return Err(SpiError::invalid_argument(format!(
            "Transfer length {} is not a multiple of the {} word granularity ({} bytes)",
            len, word_length, granularity
        )));
    }
    Ok(())
}
