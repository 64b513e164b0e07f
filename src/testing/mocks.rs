//! Mock implementations for testing
//!
//! `MockQueue` implements all four queue capabilities over in-memory state.
//! Depth snapshots can be scripted per call; once the script is exhausted
//! (or when none is supplied) the snapshot is derived from the messages
//! still enqueued, which models a well-behaved queue whose counters track
//! receives exactly.

use crate::queue::{
    DepthSnapshot, MessageAck, MessageSource, QueueAttributes, QueueError, QueueHandle, RawMessage,
    SolutionSink,
};
use crate::submit::SubmissionRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory queue for testing the drain pipeline
#[derive(Debug, Default)]
pub struct MockQueue {
    scripted_snapshots: Mutex<VecDeque<DepthSnapshot>>,
    messages: Mutex<VecDeque<RawMessage>>,
    acknowledged: Mutex<Vec<String>>,
    published: Mutex<Vec<(QueueHandle, SubmissionRecord)>>,
    snapshot_calls: AtomicU32,
    receive_calls: AtomicU32,
    fail_snapshots: bool,
    fail_receives: bool,
    fail_acknowledges: bool,
    fail_publishes: bool,
}

impl MockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue up messages to deliver in order
    pub fn with_messages(messages: Vec<RawMessage>) -> Self {
        Self {
            messages: Mutex::new(messages.into()),
            ..Default::default()
        }
    }

    /// Script the next snapshots returned, before falling back to derived ones
    pub fn with_scripted_snapshots(mut self, snapshots: Vec<DepthSnapshot>) -> Self {
        self.scripted_snapshots = Mutex::new(snapshots.into());
        self
    }

    pub fn with_snapshot_failure(mut self) -> Self {
        self.fail_snapshots = true;
        self
    }

    pub fn with_receive_failure(mut self) -> Self {
        self.fail_receives = true;
        self
    }

    pub fn with_ack_failure(mut self) -> Self {
        self.fail_acknowledges = true;
        self
    }

    pub fn with_publish_failure(mut self) -> Self {
        self.fail_publishes = true;
        self
    }

    /// Convenience constructor for a message
    pub fn message(order_index: i64, token: &str, ack_token: &str) -> RawMessage {
        RawMessage {
            order_index,
            token: token.to_string(),
            ack_token: ack_token.to_string(),
        }
    }

    pub async fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().await.clone()
    }

    pub async fn published(&self) -> Vec<(QueueHandle, SubmissionRecord)> {
        self.published.lock().await.clone()
    }

    pub fn snapshot_calls(&self) -> u32 {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn receive_calls(&self) -> u32 {
        self.receive_calls.load(Ordering::SeqCst)
    }

    pub async fn remaining_messages(&self) -> usize {
        self.messages.lock().await.len()
    }
}

#[async_trait::async_trait]
impl QueueAttributes for MockQueue {
    async fn snapshot(&self, _handle: &QueueHandle) -> Result<DepthSnapshot, QueueError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_snapshots {
            return Err(QueueError::attributes("mock attribute failure"));
        }

        if let Some(snapshot) = self.scripted_snapshots.lock().await.pop_front() {
            return Ok(snapshot);
        }

        let visible = self.messages.lock().await.len() as u64;
        Ok(DepthSnapshot::new(visible, 0, 0))
    }
}

#[async_trait::async_trait]
impl MessageSource for MockQueue {
    async fn receive_one(
        &self,
        _handle: &QueueHandle,
        _wait: Duration,
    ) -> Result<Option<RawMessage>, QueueError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_receives {
            return Err(QueueError::receive("mock receive failure"));
        }

        Ok(self.messages.lock().await.pop_front())
    }
}

#[async_trait::async_trait]
impl MessageAck for MockQueue {
    async fn acknowledge(&self, _handle: &QueueHandle, ack_token: &str) -> Result<(), QueueError> {
        if self.fail_acknowledges {
            return Err(QueueError::acknowledge("mock acknowledge failure"));
        }

        let mut acknowledged = self.acknowledged.lock().await;
        // Ack tokens are single-use: a second delete of the same delivery fails
        if acknowledged.iter().any(|token| token == ack_token) {
            return Err(QueueError::acknowledge(format!(
                "ack token already used: {ack_token}"
            )));
        }
        acknowledged.push(ack_token.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SolutionSink for MockQueue {
    async fn publish(
        &self,
        destination: &QueueHandle,
        record: &SubmissionRecord,
    ) -> Result<(), QueueError> {
        if self.fail_publishes {
            return Err(QueueError::publish("mock publish failure"));
        }

        self.published
            .lock()
            .await
            .push((destination.clone(), record.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_derives_from_remaining_messages() {
        let queue = MockQueue::with_messages(vec![
            MockQueue::message(0, "hello", "tok-0"),
            MockQueue::message(1, "world", "tok-1"),
        ]);
        let handle = QueueHandle::new("mock://queue");

        let snapshot = queue.snapshot(&handle).await.unwrap();
        assert_eq!(snapshot, DepthSnapshot::new(2, 0, 0));

        queue
            .receive_one(&handle, Duration::from_secs(0))
            .await
            .unwrap();
        let snapshot = queue.snapshot(&handle).await.unwrap();
        assert_eq!(snapshot, DepthSnapshot::new(1, 0, 0));
    }

    #[tokio::test]
    async fn test_scripted_snapshots_take_precedence() {
        let queue = MockQueue::new()
            .with_scripted_snapshots(vec![DepthSnapshot::new(0, 2, 1)]);
        let handle = QueueHandle::new("mock://queue");

        assert_eq!(
            queue.snapshot(&handle).await.unwrap(),
            DepthSnapshot::new(0, 2, 1)
        );
        // Script exhausted: falls back to derived (empty) counters
        assert_eq!(
            queue.snapshot(&handle).await.unwrap(),
            DepthSnapshot::new(0, 0, 0)
        );
    }

    #[tokio::test]
    async fn test_ack_tokens_are_single_use() {
        let queue = MockQueue::new();
        let handle = QueueHandle::new("mock://queue");

        queue.acknowledge(&handle, "tok-0").await.unwrap();
        let second = queue.acknowledge(&handle, "tok-0").await;
        assert!(matches!(second, Err(QueueError::Acknowledge { .. })));
    }
}
