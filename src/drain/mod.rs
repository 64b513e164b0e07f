//! Queue-draining state machine
//!
//! The drainer polls approximate depth counters and receives one message per
//! cycle until the queue reports empty in every state, or the cycle ceiling
//! is reached. The counters are eventually consistent, so a zero `visible`
//! reading alone never terminates the loop: messages may be in flight
//! (delivered, unacknowledged) or delayed (scheduled for later visibility),
//! and terminating on `visible == 0` would silently drop their tokens.

use crate::audit::AuditLog;
use crate::config::DrainSection;
use crate::queue::{MessageAck, MessageSource, QueueAttributes, QueueHandle};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Ordered collection of (order index, token) pairs
///
/// Grows monotonically during a drain; duplicate indices are last-write-wins
/// since upstream emits each index exactly once. Iteration is always in
/// ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection(BTreeMap<i64, String>);

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, returning any token previously held by the index
    pub fn insert<S: Into<String>>(&mut self, order_index: i64, token: S) -> Option<String> {
        self.0.insert(order_index, token.into())
    }

    pub fn get(&self, order_index: i64) -> Option<&str> {
        self.0.get(&order_index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.0.iter().map(|(index, token)| (*index, token.as_str()))
    }
}

impl FromIterator<(i64, String)> for Collection {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Backoff cadences and the cycle ceiling for one drain session
///
/// Policy, not protocol: the defaults mirror observed queue behavior but
/// every value is tunable through `[drain]` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainPolicy {
    /// Wait while messages are only in flight or delayed
    pub empty_wait: Duration,
    /// Wait after a receive that returned nothing despite a positive counter
    pub miss_wait: Duration,
    /// Wait after a transient receive or attribute-fetch fault
    pub fault_wait: Duration,
    /// Long-poll bound passed to each receive call
    pub receive_wait: Duration,
    /// Hard ceiling on poll cycles, guaranteeing termination
    pub max_cycles: u32,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self {
            empty_wait: Duration::from_secs(30),
            miss_wait: Duration::from_secs(15),
            fault_wait: Duration::from_secs(10),
            receive_wait: Duration::from_secs(5),
            max_cycles: 100,
        }
    }
}

impl From<&DrainSection> for DrainPolicy {
    fn from(section: &DrainSection) -> Self {
        Self {
            empty_wait: Duration::from_secs(section.empty_wait_secs),
            miss_wait: Duration::from_secs(section.miss_wait_secs),
            fault_wait: Duration::from_secs(section.fault_wait_secs),
            receive_wait: Duration::from_secs(section.receive_wait_secs),
            max_cycles: section.max_cycles,
        }
    }
}

/// How a drain session ended
///
/// `Complete` means every depth counter read zero: "probably complete,"
/// since the counters are hints. `Aborted` means the cycle ceiling ended the
/// session; the partial collection is still returned and downstream
/// consumers decide whether to trust it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Complete { collection: Collection, cycles: u32 },
    Aborted { collection: Collection, cycles: u32 },
}

impl DrainOutcome {
    pub fn collection(&self) -> &Collection {
        match self {
            DrainOutcome::Complete { collection, .. } => collection,
            DrainOutcome::Aborted { collection, .. } => collection,
        }
    }

    pub fn into_collection(self) -> Collection {
        match self {
            DrainOutcome::Complete { collection, .. } => collection,
            DrainOutcome::Aborted { collection, .. } => collection,
        }
    }

    pub fn cycles(&self) -> u32 {
        match self {
            DrainOutcome::Complete { cycles, .. } => *cycles,
            DrainOutcome::Aborted { cycles, .. } => *cycles,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DrainOutcome::Complete { .. })
    }
}

/// The core polling/retry state machine
///
/// Generic over the queue capabilities so any transport (or test fake) can
/// back it. One logical thread: every queue call is awaited in sequence and
/// the backoffs are cooperative sleeps.
pub struct MessageDrainer<'a, Q>
where
    Q: QueueAttributes + MessageSource + MessageAck,
{
    queue: &'a Q,
    policy: DrainPolicy,
}

impl<'a, Q> MessageDrainer<'a, Q>
where
    Q: QueueAttributes + MessageSource + MessageAck,
{
    pub fn new(queue: &'a Q, policy: DrainPolicy) -> Self {
        Self { queue, policy }
    }

    /// Drain the queue into a collection
    ///
    /// Per cycle: read a depth snapshot, then either stop (all counters
    /// zero), wait (nothing visible), or receive-record-acknowledge one
    /// message. Transient faults back off and re-poll; only the cycle
    /// ceiling aborts. Each collected pair is appended to `audit` when one
    /// is supplied.
    pub async fn drain(
        &self,
        handle: &QueueHandle,
        mut audit: Option<&mut AuditLog>,
    ) -> DrainOutcome {
        let mut collection = Collection::new();
        let mut cycles = 0u32;

        loop {
            if cycles >= self.policy.max_cycles {
                warn!(
                    cycles,
                    collected = collection.len(),
                    "Cycle ceiling reached; returning partial collection"
                );
                return DrainOutcome::Aborted { collection, cycles };
            }
            cycles += 1;

            let snapshot = match self.queue.snapshot(handle).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(error = %e, cycle = cycles, "Attribute fetch failed; backing off");
                    sleep(self.policy.fault_wait).await;
                    continue;
                }
            };

            debug!(
                visible = snapshot.visible,
                in_flight = snapshot.in_flight,
                delayed = snapshot.delayed,
                cycle = cycles,
                "Depth snapshot"
            );

            if snapshot.is_drained() {
                info!(collected = collection.len(), cycles, "Queue drained");
                return DrainOutcome::Complete { collection, cycles };
            }

            if snapshot.visible == 0 {
                // Messages exist but none are deliverable yet; receiving now
                // would busy-poll an empty window.
                debug!(
                    in_flight = snapshot.in_flight,
                    delayed = snapshot.delayed,
                    "No visible messages; waiting"
                );
                sleep(self.policy.empty_wait).await;
                continue;
            }

            match self.queue.receive_one(handle, self.policy.receive_wait).await {
                Ok(Some(message)) => {
                    debug!(
                        order_index = message.order_index,
                        token = %message.token,
                        "Collected message"
                    );
                    let replaced = collection.insert(message.order_index, message.token.clone());
                    if let Some(previous) = replaced {
                        warn!(
                            order_index = message.order_index,
                            previous = %previous,
                            "Duplicate order index; keeping the latest token"
                        );
                    }

                    if let Some(audit) = audit.as_mut() {
                        if let Err(e) = audit.record(message.order_index, &message.token) {
                            warn!(error = %e, "Audit append failed");
                        }
                    }

                    if let Err(e) = self.queue.acknowledge(handle, &message.ack_token).await {
                        // The message stays invisible until its timeout, then
                        // redelivers; a later cycle picks it up again.
                        warn!(
                            order_index = message.order_index,
                            error = %e,
                            "Acknowledge failed; message may redeliver"
                        );
                    }
                }
                Ok(None) => {
                    // The approximate counter promised a message the queue
                    // did not deliver.
                    debug!("Receive returned nothing; backing off");
                    sleep(self.policy.miss_wait).await;
                }
                Err(e) => {
                    warn!(error = %e, cycle = cycles, "Receive failed; backing off");
                    sleep(self.policy.fault_wait).await;
                }
            }
        }
    }
}
