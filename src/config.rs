//! Configuration system for gather sessions
//!
//! All tunable behavior lives here: session identity, the handshake endpoint,
//! queue client settings, drain backoff policy, and the submission target.
//! Loaded from a TOML file; nothing is read from process-global state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration structure for one gather session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatherConfig {
    pub session: SessionSection,
    pub handshake: HandshakeSection,
    #[serde(default)]
    pub queue: QueueSection,
    #[serde(default)]
    pub drain: DrainSection,
    pub submit: SubmitSection,
    #[serde(default)]
    pub audit: AuditSection,
}

/// Session identity attached to the published solution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
    /// Identity attached to the submission (must match [a-zA-Z0-9._-]+)
    pub identity_id: String,
    /// Tag naming the engine/binary that produced the result
    pub platform_tag: String,
}

/// Handshake endpoint that yields the source queue handle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandshakeSection {
    /// URL to POST for the scatter payload
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_handshake_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_handshake_timeout_secs() -> u64 {
    30
}

/// Queue client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSection {
    /// AWS region for the SQS client (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override for local stacks (optional)
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
        }
    }
}

/// Drain backoff policy
///
/// The depth counters driving the drain loop are approximate, so these waits
/// and the cycle ceiling are policy, not protocol: tune them per queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrainSection {
    /// Wait when nothing is visible but messages are in flight or delayed (default: 30)
    #[serde(default = "default_empty_wait_secs")]
    pub empty_wait_secs: u64,
    /// Wait after a receive that returned no message despite a positive counter (default: 15)
    #[serde(default = "default_miss_wait_secs")]
    pub miss_wait_secs: u64,
    /// Wait after a transient receive or attribute-fetch fault (default: 10)
    #[serde(default = "default_fault_wait_secs")]
    pub fault_wait_secs: u64,
    /// Long-poll wait passed to each receive call, 0-20 (default: 5)
    #[serde(default = "default_receive_wait_secs")]
    pub receive_wait_secs: u64,
    /// Cycle ceiling guaranteeing termination (default: 100)
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
    /// Fail assembly if collected indices have gaps (default: false)
    #[serde(default)]
    pub strict_contiguity: bool,
}

fn default_empty_wait_secs() -> u64 {
    30
}

fn default_miss_wait_secs() -> u64 {
    15
}

fn default_fault_wait_secs() -> u64 {
    10
}

fn default_receive_wait_secs() -> u64 {
    5
}

fn default_max_cycles() -> u32 {
    100
}

impl Default for DrainSection {
    fn default() -> Self {
        Self {
            empty_wait_secs: default_empty_wait_secs(),
            miss_wait_secs: default_miss_wait_secs(),
            fault_wait_secs: default_fault_wait_secs(),
            receive_wait_secs: default_receive_wait_secs(),
            max_cycles: default_max_cycles(),
            strict_contiguity: false,
        }
    }
}

/// Destination queue for the assembled solution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitSection {
    /// Fixed URL of the submission queue
    pub queue_url: String,
}

/// Optional audit sink for collected messages
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditSection {
    /// Append-only text file recording each (order, token) pair
    pub path: Option<PathBuf>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid identity format: {0}")]
    InvalidIdentity(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GatherConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: GatherConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field formats and policy bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identity(&self.session.identity_id)?;

        if self.session.platform_tag.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "session.platform_tag must not be empty".to_string(),
            ));
        }

        url::Url::parse(&self.handshake.url).map_err(|_| {
            ConfigError::InvalidConfig(format!(
                "handshake.url '{}' is not a valid URL",
                self.handshake.url
            ))
        })?;

        if self.submit.queue_url.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "submit.queue_url must not be empty".to_string(),
            ));
        }

        // SQS caps long-poll waits at 20 seconds
        if self.drain.receive_wait_secs > 20 {
            return Err(ConfigError::InvalidConfig(format!(
                "drain.receive_wait_secs must be 0-20, got {}",
                self.drain.receive_wait_secs
            )));
        }

        if self.drain.max_cycles == 0 {
            return Err(ConfigError::InvalidConfig(
                "drain.max_cycles must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[session]
identity_id = "test-identity"
platform_tag = "test"

[handshake]
url = "https://handshake.example.com/api/scatter/test-identity"

[submit]
queue_url = "https://sqs.us-east-1.amazonaws.com/000000000000/submit"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate identity format: non-empty, [a-zA-Z0-9._-]+ only
fn validate_identity(identity_id: &str) -> Result<(), ConfigError> {
    let valid_chars = identity_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if identity_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidIdentity(format!(
            "Identity '{identity_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
