//! Queue capability seam
//!
//! This module defines the narrow capability traits the drain pipeline is
//! written against, plus the wire-level types they exchange. The traits keep
//! the core logic independent of any concrete queue SDK and make the state
//! machine testable with in-memory fakes.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod sqs;

/// Opaque address of a queue, obtained from the handshake service
///
/// Immutable for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueHandle(String);

impl QueueHandle {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Approximate, eventually-consistent depth counters for a queue
///
/// A zero reading is a hint, never an instantaneous guarantee of emptiness;
/// the counters may lag real queue state by seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Messages currently eligible for delivery
    pub visible: u64,
    /// Messages delivered but not yet acknowledged
    pub in_flight: u64,
    /// Messages scheduled to become visible later
    pub delayed: u64,
}

impl DepthSnapshot {
    pub fn new(visible: u64, in_flight: u64, delayed: u64) -> Self {
        Self {
            visible,
            in_flight,
            delayed,
        }
    }

    /// Total messages in any state
    pub fn total(&self) -> u64 {
        self.visible + self.in_flight + self.delayed
    }

    /// True when every counter reads zero
    pub fn is_drained(&self) -> bool {
        self.total() == 0
    }
}

/// One received message: its ordering index, token, and single-use ack token
///
/// The ack token proves receipt of this specific delivery; once acknowledged
/// it is permanently invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub order_index: i64,
    pub token: String,
    pub ack_token: String,
}

/// Queue-level fault taxonomy
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Attribute query failed: {message}")]
    Attributes { message: String },

    #[error("Receive failed: {message}")]
    Receive { message: String },

    #[error("Acknowledge failed: {message}")]
    Acknowledge { message: String },

    #[error("Publish failed: {message}")]
    Publish { message: String },
}

impl QueueError {
    pub fn attributes<S: Into<String>>(message: S) -> Self {
        Self::Attributes {
            message: message.into(),
        }
    }

    pub fn receive<S: Into<String>>(message: S) -> Self {
        Self::Receive {
            message: message.into(),
        }
    }

    pub fn acknowledge<S: Into<String>>(message: S) -> Self {
        Self::Acknowledge {
            message: message.into(),
        }
    }

    pub fn publish<S: Into<String>>(message: S) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }
}

/// Read the approximate depth counters for a queue
///
/// Pure read: no queue state changes. Fails when the underlying query does
/// not return the expected counters.
#[async_trait::async_trait]
pub trait QueueAttributes: Send + Sync {
    async fn snapshot(&self, handle: &QueueHandle) -> Result<DepthSnapshot, QueueError>;
}

/// Receive at most one message per call
///
/// `wait` bounds the long-poll; `Ok(None)` means no message arrived within
/// it, which callers must treat as a counter race rather than an error.
#[async_trait::async_trait]
pub trait MessageSource: Send + Sync {
    async fn receive_one(
        &self,
        handle: &QueueHandle,
        wait: Duration,
    ) -> Result<Option<RawMessage>, QueueError>;
}

/// Acknowledge (delete) a delivered message by its ack token
#[async_trait::async_trait]
pub trait MessageAck: Send + Sync {
    async fn acknowledge(&self, handle: &QueueHandle, ack_token: &str) -> Result<(), QueueError>;
}

/// Publish a solution record to a destination queue
#[async_trait::async_trait]
pub trait SolutionSink: Send + Sync {
    async fn publish(
        &self,
        destination: &QueueHandle,
        record: &crate::submit::SubmissionRecord,
    ) -> Result<(), QueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_snapshot_total() {
        let snapshot = DepthSnapshot::new(3, 2, 1);
        assert_eq!(snapshot.total(), 6);
        assert!(!snapshot.is_drained());
    }

    #[test]
    fn test_depth_snapshot_drained_only_when_all_zero() {
        assert!(DepthSnapshot::new(0, 0, 0).is_drained());
        assert!(!DepthSnapshot::new(0, 1, 0).is_drained());
        assert!(!DepthSnapshot::new(0, 0, 1).is_drained());
        assert!(!DepthSnapshot::new(1, 0, 0).is_drained());
    }

    #[test]
    fn test_queue_handle_display() {
        let handle = QueueHandle::new("https://sqs.example.com/123/scatter");
        assert_eq!(handle.to_string(), "https://sqs.example.com/123/scatter");
        assert_eq!(handle.as_str(), "https://sqs.example.com/123/scatter");
    }

    #[test]
    fn test_queue_error_constructors() {
        let error = QueueError::receive("socket closed");
        assert!(matches!(error, QueueError::Receive { .. }));
        assert_eq!(error.to_string(), "Receive failed: socket closed");

        let error = QueueError::attributes("partial response");
        assert_eq!(error.to_string(), "Attribute query failed: partial response");
    }
}
