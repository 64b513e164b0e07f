//! regather - scatter-queue drain worker
//!
//! Collects out-of-order, attribute-tagged messages from a scatter queue,
//! reassembles them into an ordered phrase, and republishes the result with
//! identifying metadata.
//!
//! # Overview
//!
//! This crate provides the full drain pipeline:
//! - A handshake client that trades one HTTP request for a queue handle
//! - The core polling/retry state machine over approximate depth counters
//! - Deterministic phrase assembly from the collected index-to-token pairs
//! - Solution publishing to a fixed destination queue
//!
//! The pipeline is written against narrow capability traits
//! ([`queue::QueueAttributes`], [`queue::MessageSource`], [`queue::MessageAck`],
//! [`queue::SolutionSink`]) with an SQS implementation in [`queue::sqs`], so
//! the core logic runs unchanged over in-memory fakes in tests.
//!
//! # Quick Start
//!
//! ```rust
//! use regather::assemble::PhraseAssembler;
//! use regather::drain::Collection;
//!
//! // Messages arrive in arbitrary order; the collection keeps them sorted
//! let mut collection = Collection::new();
//! collection.insert(2, "world");
//! collection.insert(0, "hello");
//! collection.insert(1, "brave");
//!
//! let phrase = PhraseAssembler::new().assemble(&collection).unwrap();
//! assert_eq!(phrase, "hello brave world");
//! ```

pub mod assemble;
pub mod audit;
pub mod config;
pub mod drain;
pub mod error;
pub mod handshake;
pub mod observability;
pub mod queue;
pub mod session;
pub mod submit;
pub mod testing;

pub use assemble::PhraseAssembler;
pub use audit::AuditLog;
pub use config::GatherConfig;
pub use drain::{Collection, DrainOutcome, DrainPolicy, MessageDrainer};
pub use error::{GatherError, GatherResult};
pub use handshake::HandshakeClient;
pub use queue::{
    DepthSnapshot, MessageAck, MessageSource, QueueAttributes, QueueError, QueueHandle, RawMessage,
    SolutionSink,
};
pub use session::{GatherSession, SessionOutcome};
pub use submit::{SolutionPublisher, SubmissionRecord};
