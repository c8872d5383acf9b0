//! Drains the persistent outbound queue on the coarse retry schedule,
//! moving entries that exhaust their attempts to the dead-letter queue.

use std::sync::Arc;

use a2a_types::{DlqEntry, QueueEntry};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::egress::deliver_once;
use crate::events::NodeEvent;
use crate::node::Node;

/// How often the worker wakes up to check for due entries.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

/// Entries exhaust the coarse schedule (5 stages) and move to the DLQ.
const MAX_QUEUE_ATTEMPTS: u32 = 5;

fn due(entry: &QueueEntry, now: chrono::DateTime<Utc>) -> bool {
    match entry.last_attempt {
        None => true,
        Some(last) => now >= last + a2a_delivery::persistent_queue_delay(entry.attempts),
    }
}

/// Runs until `shutdown` fires. Intended to be spawned as its own task.
pub async fn run(node: Arc<Node>, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = drain_once(&node).await {
                    warn!(error = %e, "queue worker tick failed");
                }
            }
            _ = shutdown.recv() => {
                info!("queue worker stopping");
                return;
            }
        }
    }
}

/// One drain pass: sweeps expired entries, then attempts delivery of every
/// due pending entry. Exposed so callers that don't want to wait on
/// [`POLL_INTERVAL`] (tests, a manual "flush now" admin action) can drive it
/// directly.
pub async fn drain_once(node: &Node) -> Result<(), a2a_store::StoreError> {
    let expired = node.queue().sweep_expired()?;
    if expired > 0 {
        debug!(expired, "queue sweep expired stale entries");
    }

    let now = Utc::now();
    for entry in node.queue().pending_in_order()? {
        if !due(&entry, now) {
            continue;
        }
        if !node.breakers().allow_request(&entry.endpoint, now) {
            continue;
        }
        attempt_delivery(node, entry, now).await?;
    }
    Ok(())
}

async fn attempt_delivery(node: &Node, mut entry: QueueEntry, now: chrono::DateTime<Utc>) -> Result<(), a2a_store::StoreError> {
    match deliver_once(node, &entry.endpoint, &entry.envelope).await {
        Ok(_body) => {
            let before = node.breakers().state_of(&entry.endpoint);
            node.breakers().record_success(&entry.endpoint);
            crate::egress::emit_breaker_transition(node, &entry.endpoint, before);
            node.delivery_tracker().record(entry.envelope.id, a2a_types::envelope::ReceiptStatus::Sent, now);
            node.events().emit(NodeEvent::Sent { envelope_id: entry.envelope.id, to_agent: entry.envelope.to.agent.clone() });
            node.queue().remove(entry.id)?;
            info!(id = %entry.id, "queued envelope delivered");
        }
        Err(error) => {
            let before = node.breakers().state_of(&entry.endpoint);
            node.breakers().record_failure(&entry.endpoint, now);
            crate::egress::emit_breaker_transition(node, &entry.endpoint, before);
            entry.record_failure(error.clone(), now);
            if entry.attempts >= MAX_QUEUE_ATTEMPTS {
                let envelope_id = entry.envelope.id;
                let dlq_entry = DlqEntry::from_queue_entry(entry.clone(), error);
                node.dlq().record(&dlq_entry)?;
                node.queue().remove(entry.id)?;
                node.events().emit(NodeEvent::Failed { envelope_id, reason: dlq_entry.error.clone() });
                warn!(id = %entry.id, "queue entry exhausted retries, moved to dead-letter queue");
            } else {
                node.queue().update(&entry)?;
                debug!(id = %entry.id, attempts = entry.attempts, "queue delivery attempt failed, will retry");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_types::envelope::{Envelope, EnvelopeType, From, Payload, To};
    use uuid::Uuid;

    fn sample_entry() -> QueueEntry {
        let envelope = Envelope {
            proto_version: "1.0".to_string(),
            id: Uuid::new_v4(),
            nonce: "abcd1234abcd1234abcd1234abcd1234".to_string(),
            timestamp: Utc::now(),
            expires_at: None,
            from: From { agent: "agent://alice.example".to_string(), human: "Alice".to_string() },
            to: To { agent: "agent://bob.example".to_string() },
            conversation: Uuid::new_v4(),
            envelope_type: EnvelopeType::Message,
            intent: None,
            payload: Payload::Plain(serde_json::json!({})),
            requires_human_approval: false,
            signature: None,
        };
        QueueEntry::new(envelope, "https://bob.example/ai2ai".to_string(), 0)
    }

    #[test]
    fn test_fresh_entry_is_immediately_due() {
        assert!(due(&sample_entry(), Utc::now()));
    }

    #[test]
    fn test_recently_failed_entry_is_not_yet_due() {
        let mut entry = sample_entry();
        entry.record_failure("timeout".to_string(), Utc::now());
        assert!(!due(&entry, Utc::now()));
    }

    #[test]
    fn test_entry_becomes_due_after_its_schedule_delay() {
        let mut entry = sample_entry();
        let past = Utc::now() - chrono::Duration::minutes(2);
        entry.record_failure("timeout".to_string(), past);
        assert!(due(&entry, Utc::now()));
    }
}
