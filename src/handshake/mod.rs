//! Handshake with the scatter service
//!
//! One POST to the configured endpoint yields a JSON payload whose
//! `sqs_url` key is the source queue handle for the session. A payload
//! without that key is a fatal configuration fault, never retried.

use crate::config::HandshakeSection;
use crate::error::{GatherError, GatherResult};
use crate::queue::QueueHandle;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Payload key carrying the source queue handle
const QUEUE_HANDLE_KEY: &str = "sqs_url";

/// HTTP client for the handshake endpoint
#[derive(Debug, Clone)]
pub struct HandshakeClient {
    client: reqwest::Client,
    url: String,
}

impl HandshakeClient {
    pub fn new(config: &HandshakeSection) -> GatherResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatherError::handshake(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Request the scatter payload and extract the source queue handle
    pub async fn acquire_queue_handle(&self) -> GatherResult<QueueHandle> {
        debug!(url = %self.url, "Requesting scatter payload");

        let response = self
            .client
            .post(self.url.as_str())
            .send()
            .await
            .map_err(|e| GatherError::handshake(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatherError::handshake(e.to_string()))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatherError::handshake(format!("payload is not JSON: {e}")))?;

        let handle = payload
            .get(QUEUE_HANDLE_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| GatherError::missing_queue_handle(QUEUE_HANDLE_KEY))?;

        info!(queue_url = handle, "Handshake complete");
        Ok(QueueHandle::new(handle))
    }
}
