//! Solution submission
//!
//! Sends the assembled phrase plus identifying metadata to the fixed
//! destination queue. Faults surface to the caller; retry policy belongs to
//! whoever drives the session.

use crate::error::GatherResult;
use crate::queue::{QueueHandle, SolutionSink};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Metadata-tagged payload sent to the destination queue
///
/// The phrase doubles as the message body and the `phrase` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub identity_id: String,
    pub phrase: String,
    pub platform_tag: String,
}

impl SubmissionRecord {
    pub fn new<I, P, T>(identity_id: I, phrase: P, platform_tag: T) -> Self
    where
        I: Into<String>,
        P: Into<String>,
        T: Into<String>,
    {
        Self {
            identity_id: identity_id.into(),
            phrase: phrase.into(),
            platform_tag: platform_tag.into(),
        }
    }
}

/// Publishes one solution record through the sink capability
pub struct SolutionPublisher<'a, S>
where
    S: SolutionSink,
{
    sink: &'a S,
    destination: QueueHandle,
}

impl<'a, S> SolutionPublisher<'a, S>
where
    S: SolutionSink,
{
    pub fn new(sink: &'a S, destination: QueueHandle) -> Self {
        Self { sink, destination }
    }

    /// Send the record; one attempt, no internal retry
    pub async fn publish(&self, record: &SubmissionRecord) -> GatherResult<()> {
        info!(
            destination = %self.destination,
            identity_id = %record.identity_id,
            platform_tag = %record.platform_tag,
            "Publishing solution"
        );
        self.sink.publish(&self.destination, record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatherError;
    use crate::testing::mocks::MockQueue;

    #[test]
    fn test_record_construction() {
        let record = SubmissionRecord::new("abc5xy", "hello world", "tokio");
        assert_eq!(record.identity_id, "abc5xy");
        assert_eq!(record.phrase, "hello world");
        assert_eq!(record.platform_tag, "tokio");
    }

    #[test]
    fn test_publish_delivers_record_to_destination() {
        let queue = MockQueue::new();
        let destination = QueueHandle::new("https://sqs.example.com/123/submit");
        let publisher = SolutionPublisher::new(&queue, destination.clone());
        let record = SubmissionRecord::new("abc5xy", "hello brave world", "tokio");

        tokio_test::block_on(publisher.publish(&record)).unwrap();

        let published = tokio_test::block_on(queue.published());
        assert_eq!(published, vec![(destination, record)]);
    }

    #[test]
    fn test_publish_fault_surfaces() {
        let queue = MockQueue::new().with_publish_failure();
        let destination = QueueHandle::new("https://sqs.example.com/123/submit");
        let publisher = SolutionPublisher::new(&queue, destination);
        let record = SubmissionRecord::new("abc5xy", "hello", "tokio");

        let result = tokio_test::block_on(publisher.publish(&record));
        assert!(matches!(result, Err(GatherError::Queue(_))));
    }
}
