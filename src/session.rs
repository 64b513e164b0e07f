//! One full gather session
//!
//! Linear composition: handshake, drain, assemble, publish. The session
//! is generic over the queue capability set; all collaborators are injected
//! by the caller, so no scheduling framework or process-global state is
//! assumed.

use crate::assemble::PhraseAssembler;
use crate::audit::AuditLog;
use crate::config::GatherConfig;
use crate::drain::{DrainPolicy, MessageDrainer};
use crate::error::GatherResult;
use crate::handshake::HandshakeClient;
use crate::queue::{MessageAck, MessageSource, QueueAttributes, QueueHandle, SolutionSink};
use crate::submit::{SolutionPublisher, SubmissionRecord};
use crate::{drain_span, queue_span, session_span};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Result of a finished session
///
/// `complete` distinguishes a drain that saw every depth counter at zero
/// from one the cycle ceiling ended; both publish, but callers must treat
/// the latter as possibly incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub phrase: String,
    pub complete: bool,
    pub cycles: u32,
    pub collected: usize,
}

/// Drives one drain-assemble-publish pass over a scatter queue
pub struct GatherSession<'a, Q>
where
    Q: QueueAttributes + MessageSource + MessageAck + SolutionSink,
{
    session_id: Uuid,
    config: GatherConfig,
    handshake: HandshakeClient,
    queue: &'a Q,
    audit: Option<AuditLog>,
}

impl<'a, Q> GatherSession<'a, Q>
where
    Q: QueueAttributes + MessageSource + MessageAck + SolutionSink,
{
    /// Create a session with injected collaborators
    pub fn new(
        session_id: Uuid,
        config: GatherConfig,
        handshake: HandshakeClient,
        queue: &'a Q,
        audit: Option<AuditLog>,
    ) -> Self {
        Self {
            session_id,
            config,
            handshake,
            queue,
            audit,
        }
    }

    /// Run the session to completion
    pub async fn run(mut self) -> GatherResult<SessionOutcome> {
        let span = session_span!(
            session_id = %self.session_id,
            identity_id = %self.config.session.identity_id,
            platform_tag = %self.config.session.platform_tag,
        );

        async move {
            let handle = self.handshake.acquire_queue_handle().await?;

            let policy = DrainPolicy::from(&self.config.drain);
            let drainer = MessageDrainer::new(self.queue, policy);
            let outcome = drainer
                .drain(&handle, self.audit.as_mut())
                .instrument(drain_span!(queue = %handle))
                .await;

            if !outcome.is_complete() {
                warn!(
                    cycles = outcome.cycles(),
                    collected = outcome.collection().len(),
                    "Drain hit the cycle ceiling; submitting a possibly incomplete phrase"
                );
            }

            let assembler =
                PhraseAssembler::with_strict_contiguity(self.config.drain.strict_contiguity);
            let phrase = assembler.assemble(outcome.collection())?;
            info!(phrase = %phrase, collected = outcome.collection().len(), "Phrase assembled");

            let record = SubmissionRecord::new(
                &self.config.session.identity_id,
                &phrase,
                &self.config.session.platform_tag,
            );
            let destination = QueueHandle::new(self.config.submit.queue_url.clone());
            let publisher = SolutionPublisher::new(self.queue, destination);
            publisher
                .publish(&record)
                .instrument(queue_span!(op = "publish"))
                .await?;

            info!(complete = outcome.is_complete(), "Session finished");

            Ok(SessionOutcome {
                phrase,
                complete: outcome.is_complete(),
                cycles: outcome.cycles(),
                collected: outcome.collection().len(),
            })
        }
        .instrument(span)
        .await
    }
}
