//! Common types shared across the SPI driver layer.
//!
//! This module defines the plain data types used by both transports and the
//! device façade: the configured word length of the bus, the fixed buffer
//! slot identifiers of the completion-queue path, and the device
//! construction configuration.

use crate::{Result, constants::MIN_BLOCK_SIZE, error::SpiError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit width of one atomic transfer element on the bus.
///
/// The word length determines transfer granularity: 32-bit words move four
/// bytes at a time, so every 32-bit transfer length must be a multiple of
/// four. 8- and 16-bit devices transfer byte-at-a-time on the register
/// interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordLength {
    /// 8-bit words.
    Bits8,

    /// 16-bit words.
    Bits16,

    /// 32-bit words.
    Bits32,
}

impl WordLength {
    /// Create a word length from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns `SpiError::InvalidArgument` if `bits` is not 8, 16, or 32.
    ///
    /// # Examples
    ///
    /// ```
    /// use spindle_core::WordLength;
    ///
    /// assert_eq!(WordLength::from_bits(32).unwrap(), WordLength::Bits32);
    /// assert!(WordLength::from_bits(24).is_err());
    /// ```
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            8 => Ok(Self::Bits8),
            16 => Ok(Self::Bits16),
            32 => Ok(Self::Bits32),
            other => Err(SpiError::invalid_argument(format!(
                "Word length must be 8, 16, or 32 bits, got {}",
                other
            ))),
        }
    }

    /// Get the raw bit count.
    #[must_use]
    pub fn bits(&self) -> u8 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits32 => 32,
        }
    }

    /// Byte granularity of one register-level transfer.
    ///
    /// This is both the alignment every transfer length must satisfy and
    /// the number of bytes the read pump moves per raw read: four bytes for
    /// 32-bit words, one byte otherwise.
    #[must_use]
    pub fn granularity(&self) -> usize {
        match self {
            Self::Bits32 => 4,
            _ => 1,
        }
    }
}

impl fmt::Display for WordLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.bits())
    }
}

/// Identifier of one of the two pre-registered fixed buffers.
///
/// The completion-queue transport registers exactly two buffers: slot 0 is
/// filled by the caller and submitted for writes, slot 1 receives inbound
/// data for reads. The slots are never shared between a fill and a drain
/// operation at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    /// Slot 0: write-only buffer, populated by the caller before submission.
    Write,

    /// Slot 1: read-only buffer, filled by the peripheral on completion.
    Read,
}

impl BufferSlot {
    /// Registration index of this slot.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Write => 0,
            Self::Read => 1,
        }
    }
}

impl fmt::Display for BufferSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write slot"),
            Self::Read => write!(f, "read slot"),
        }
    }
}

/// Construction configuration for an SPI device.
///
/// A configured block size enables the fixed-buffer path: the
/// completion-queue transport registers its two buffer slots at that size,
/// and the block-suffixed operations become available.
///
/// # Examples
///
/// ```
/// use spindle_core::{SpiConfig, WordLength};
///
/// let config = SpiConfig::new(WordLength::Bits8).with_block_size(64);
/// assert_eq!(config.block_size, Some(64));
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiConfig {
    /// Configured word length of the bus device.
    pub word_length: WordLength,

    /// Optional block size in bytes; presence enables the fixed-buffer path.
    pub block_size: Option<usize>,
}

impl SpiConfig {
    /// Create a configuration with the given word length and no block size.
    pub fn new(word_length: WordLength) -> Self {
        Self {
            word_length,
            block_size: None,
        }
    }

    /// Set the block size, enabling the fixed-buffer path.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `SpiError::InvalidArgument` if the block size is below the
    /// minimum or is not aligned to the word granularity.
    pub fn validate(&self) -> Result<()> {
        if let Some(block_size) = self.block_size {
            if block_size < MIN_BLOCK_SIZE {
                return Err(SpiError::invalid_argument(format!(
                    "Block size must be at least {}, got {}",
                    MIN_BLOCK_SIZE, block_size
                )));
            }
            let granularity = self.word_length.granularity();
            if block_size % granularity != 0 {
                return Err(SpiError::invalid_argument(format!(
                    "Block size {} is not a multiple of the {} word granularity ({} bytes)",
                    block_size, self.word_length, granularity
                )));
            }
        }
        Ok(())
    }
}
