//! Error types and handling for the Sluice library

use thiserror::Error;

/// Result type alias for Sluice operations
pub type Result<T> = std::result::Result<T, SluiceError>;

/// Main error type for the Sluice library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SluiceError {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Consumer id outside `[0, num_consumers)`
    #[error("Invalid consumer id {id}: ring buffer has {num_consumers} consumers")]
    InvalidConsumerId {
        /// The id that was passed in
        id: usize,
        /// Number of consumers the ring buffer was built with
        num_consumers: usize,
    },

    /// Ring buffer was shut down while the caller was waiting
    #[error("Ring buffer was shut down")]
    Shutdown,

    /// Ring buffer has no room for the whole batch right now
    #[error("Ring buffer is full")]
    RingBufferFull,

    /// Timeout errors
    #[error("Operation timed out")]
    Timeout,

    /// Generic error for unexpected conditions.
    /// Reaching this means a protocol invariant was broken.
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Error message describing the unexpected condition
        message: String,
    },
}

impl SluiceError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new invalid consumer id error
    pub fn invalid_consumer(id: usize, num_consumers: usize) -> Self {
        Self::InvalidConsumerId { id, num_consumers }
    }

    /// Create a new unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (retrying later may succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RingBufferFull | Self::Timeout)
    }

    /// Check if this error ends the ring buffer's useful life
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Shutdown)
    }

    /// Check if this error is a caller programming error
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidConsumerId { .. })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::SluiceError::config(format!($($arg)*))
    };
}
