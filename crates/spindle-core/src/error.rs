//! Error types for SPI driver operations.
//!
//! This module defines the single error domain shared by the device façade,
//! both transports, and the readiness machinery. Lower-level errno-class
//! failures from the completion-queue primitive or from raw register access
//! are mapped into [`SpiError::Io`]; everything the driver itself detects
//! has a dedicated variant.

use thiserror::Error;

/// Result type alias for SPI driver operations.
pub type Result<T> = std::result::Result<T, SpiError>;

/// Errors that can occur during SPI driver operations.
#[derive(Debug, Error)]
pub enum SpiError {
    /// An argument failed validation before the transfer started.
    ///
    /// Raised for out-of-range counts, 32-bit transfers whose length is not
    /// a multiple of four, block operations on a device without a configured
    /// block size, and invalid construction configuration.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A transfer completed with fewer bytes than requested.
    ///
    /// The errno-style "resource temporarily unavailable" outcome: the
    /// peripheral accepted the submission but the completion reported a
    /// byte count different from the requested length.
    #[error("Resource temporarily unavailable: transferred {completed} of {requested} bytes")]
    ShortTransfer { requested: usize, completed: usize },

    /// The operation was resolved during device teardown.
    #[error("Operation canceled during device teardown")]
    Canceled,

    /// A lower-level failure from the completion primitive or raw register
    /// access, propagated into the driver's error domain.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpiError {
    /// Create a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new short transfer error.
    pub fn short_transfer(requested: usize, completed: usize) -> Self {
        Self::ShortTransfer {
            requested,
            completed,
        }
    }
}
