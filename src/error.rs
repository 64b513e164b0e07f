//! Crate-wide error types for gather sessions
//!
//! Every fault a session can surface is an explicit variant here; queue-level
//! faults carry their own module-local type and convert via `From`.

use thiserror::Error;

/// Main error type for gather session operations
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Handshake request failed: {message}")]
    Handshake { message: String },

    #[error("Handshake payload is missing the '{key}' key")]
    MissingQueueHandle { key: String },

    #[error("Queue error: {0}")]
    Queue(#[from] crate::queue::QueueError),

    #[error("Nothing was collected; cannot assemble a phrase")]
    EmptyCollection,

    #[error("Collected indices are not contiguous: expected {expected}, found {found}")]
    NonContiguous { expected: i64, found: i64 },

    #[error("Audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl GatherError {
    /// Create a handshake transport error
    pub fn handshake<S: Into<String>>(message: S) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Create a missing-queue-handle error for the named payload key
    pub fn missing_queue_handle<S: Into<String>>(key: S) -> Self {
        Self::MissingQueueHandle { key: key.into() }
    }

    /// True when the fault is fatal configuration, not a retryable condition
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            GatherError::Config(_) | GatherError::MissingQueueHandle { .. }
        )
    }
}

/// Result type for gather operations
pub type GatherResult<T> = Result<T, GatherError>;
