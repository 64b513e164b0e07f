//! SQS implementation of the queue capability traits
//!
//! One client serves every capability: depth snapshots, one-at-a-time
//! receives, acknowledgments, and solution publishing. Malformed messages
//! (missing `order_no`/`word` attributes) are logged and reported as a miss
//! rather than propagated; the queue's redelivery makes them visible again.

use super::{
    DepthSnapshot, MessageAck, MessageSource, QueueAttributes, QueueError, QueueHandle, RawMessage,
    SolutionSink,
};
use crate::config::QueueSection;
use crate::submit::SubmissionRecord;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::types::{MessageAttributeValue, QueueAttributeName};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Message attribute carrying the string-encoded ordering index
const ORDER_ATTRIBUTE: &str = "order_no";
/// Message attribute carrying the token
const TOKEN_ATTRIBUTE: &str = "word";

/// SQS-backed queue client implementing all four capabilities
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
}

impl SqsQueue {
    /// Build a client from the default credential chain and queue settings
    pub async fn connect(config: &QueueSection) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_sqs::config::Builder::from(&shared);
        // Endpoint override for local stacks (LocalStack, ElasticMQ)
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: aws_sdk_sqs::Client::from_conf(builder.build()),
        }
    }

    /// Wrap an already-configured client (used by integration harnesses)
    pub fn from_client(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }

    fn parse_counter(
        attrs: &HashMap<QueueAttributeName, String>,
        name: QueueAttributeName,
    ) -> Result<u64, QueueError> {
        let raw = attrs.get(&name).ok_or_else(|| {
            QueueError::attributes(format!("response is missing {}", name.as_str()))
        })?;
        raw.parse::<u64>().map_err(|_| {
            QueueError::attributes(format!("{} is not a count: '{raw}'", name.as_str()))
        })
    }

    fn string_attribute<'a>(
        attrs: &'a HashMap<String, MessageAttributeValue>,
        name: &str,
    ) -> Option<&'a str> {
        attrs.get(name).and_then(|value| value.string_value())
    }

    fn solution_attribute(value: &str) -> Result<MessageAttributeValue, QueueError> {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .map_err(|e| QueueError::publish(format!("invalid message attribute: {e}")))
    }
}

#[async_trait::async_trait]
impl QueueAttributes for SqsQueue {
    async fn snapshot(&self, handle: &QueueHandle) -> Result<DepthSnapshot, QueueError> {
        let response = self
            .client
            .get_queue_attributes()
            .queue_url(handle.as_str())
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesNotVisible)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesDelayed)
            .send()
            .await
            .map_err(|e| QueueError::attributes(e.to_string()))?;

        let attrs = response
            .attributes()
            .ok_or_else(|| QueueError::attributes("response carries no attributes"))?;

        Ok(DepthSnapshot {
            visible: Self::parse_counter(attrs, QueueAttributeName::ApproximateNumberOfMessages)?,
            in_flight: Self::parse_counter(
                attrs,
                QueueAttributeName::ApproximateNumberOfMessagesNotVisible,
            )?,
            delayed: Self::parse_counter(
                attrs,
                QueueAttributeName::ApproximateNumberOfMessagesDelayed,
            )?,
        })
    }
}

#[async_trait::async_trait]
impl MessageSource for SqsQueue {
    async fn receive_one(
        &self,
        handle: &QueueHandle,
        wait: Duration,
    ) -> Result<Option<RawMessage>, QueueError> {
        let response = self
            .client
            .receive_message()
            .queue_url(handle.as_str())
            .max_number_of_messages(1)
            .wait_time_seconds(wait.as_secs().min(20) as i32)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| QueueError::receive(e.to_string()))?;

        let Some(message) = response.messages().first() else {
            return Ok(None);
        };

        let message_id = message.message_id().unwrap_or("unknown");

        let Some(ack_token) = message.receipt_handle() else {
            warn!(message_id, "Message has no receipt handle; skipping");
            return Ok(None);
        };

        let Some(attrs) = message.message_attributes() else {
            warn!(message_id, "Message carries no attributes; skipping");
            return Ok(None);
        };

        let Some(order_raw) = Self::string_attribute(attrs, ORDER_ATTRIBUTE) else {
            warn!(message_id, "Message is missing '{ORDER_ATTRIBUTE}'; skipping");
            return Ok(None);
        };

        let Ok(order_index) = order_raw.parse::<i64>() else {
            warn!(
                message_id,
                order_raw, "'{ORDER_ATTRIBUTE}' is not an integer; skipping"
            );
            return Ok(None);
        };

        let Some(token) = Self::string_attribute(attrs, TOKEN_ATTRIBUTE) else {
            warn!(message_id, "Message is missing '{TOKEN_ATTRIBUTE}'; skipping");
            return Ok(None);
        };

        debug!(message_id, order_index, "Received message");

        Ok(Some(RawMessage {
            order_index,
            token: token.to_string(),
            ack_token: ack_token.to_string(),
        }))
    }
}

#[async_trait::async_trait]
impl MessageAck for SqsQueue {
    async fn acknowledge(&self, handle: &QueueHandle, ack_token: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(handle.as_str())
            .receipt_handle(ack_token)
            .send()
            .await
            .map_err(|e| QueueError::acknowledge(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SolutionSink for SqsQueue {
    async fn publish(
        &self,
        destination: &QueueHandle,
        record: &SubmissionRecord,
    ) -> Result<(), QueueError> {
        let response = self
            .client
            .send_message()
            .queue_url(destination.as_str())
            .message_body(&record.phrase)
            .message_attributes("uvaid", Self::solution_attribute(&record.identity_id)?)
            .message_attributes("phrase", Self::solution_attribute(&record.phrase)?)
            .message_attributes("platform", Self::solution_attribute(&record.platform_tag)?)
            .send()
            .await
            .map_err(|e| QueueError::publish(e.to_string()))?;

        debug!(
            message_id = response.message_id().unwrap_or("unknown"),
            "Published solution"
        );
        Ok(())
    }
}
