//! Error types for key-value client operations

use thiserror::Error;

/// Result type for key-value client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error type for key-value client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Error raised by the store client: dial, authentication, IO or a
    /// server error reply
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Reply could not be coerced into the requested type
    #[error("Type conversion error: {0}")]
    Type(String),

    /// Argument rejected before anything was sent to the store
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Value could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hash fields could not populate the destination record
    #[error("Record error: {0}")]
    Record(String),

    /// The connection pool could not be built
    #[error("Initialization failed: {0}")]
    Init(String),

    /// The connection pool has been closed
    #[error("Connection pool is closed")]
    PoolClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,
}

impl ClientError {
    /// Check if this error means the underlying connection can no longer be
    /// trusted (IO failure, dropped or refused connection, timeout)
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Redis(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
            }
            Self::Timeout => true,
            _ => false,
        }
    }

    /// Check if this is a type conversion error
    #[must_use]
    pub const fn is_type_error(&self) -> bool {
        matches!(self, Self::Type(_))
    }
}
