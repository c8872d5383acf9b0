//! Outbound delivery queue and dead-letter entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::Envelope;

/// Lifecycle status of a queued delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Retrying,
    Delivered,
    Failed,
    Expired,
}

/// An envelope awaiting delivery to `endpoint`. Survives process restart —
/// `a2a-store` persists one JSON file per entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: Uuid,
    pub envelope: Envelope,
    pub endpoint: String,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub status: QueueStatus,
}

impl QueueEntry {
    pub fn new(envelope: Envelope, endpoint: String, priority: u8) -> Self {
        let expires_at = envelope.expires_at;
        Self {
            id: envelope.id,
            envelope,
            endpoint,
            priority,
            created_at: Utc::now(),
            expires_at,
            attempts: 0,
            last_attempt: None,
            last_error: None,
            status: QueueStatus::Pending,
        }
    }

    pub fn record_failure(&mut self, error: String, at: DateTime<Utc>) {
        self.attempts += 1;
        self.last_attempt = Some(at);
        self.last_error = Some(error);
        self.status = QueueStatus::Retrying;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// An entry that exhausted its retry budget. No automatic retry; an
/// operator must act on it explicitly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqEntry {
    pub id: String,
    pub envelope: Envelope,
    pub error: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

impl DlqEntry {
    pub fn from_queue_entry(entry: QueueEntry, final_error: String) -> Self {
        Self {
            id: format!("{}-{}", entry.id, entry.attempts),
            envelope: entry.envelope,
            error: final_error,
            attempts: entry.attempts,
            failed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{EnvelopeType, From, Payload, To};

    fn sample_envelope() -> Envelope {
        Envelope {
            proto_version: "1.0".to_string(),
            id: Uuid::new_v4(),
            nonce: "abcd1234abcd1234abcd1234abcd1234".to_string(),
            timestamp: Utc::now(),
            expires_at: None,
            from: From {
                agent: "agent://alice.example".to_string(),
                human: "Alice".to_string(),
            },
            to: To {
                agent: "agent://bob.example".to_string(),
            },
            conversation: Uuid::new_v4(),
            envelope_type: EnvelopeType::Message,
            intent: Some("schedule.meeting".to_string()),
            payload: Payload::Plain(serde_json::json!({"text": "hi"})),
            requires_human_approval: false,
            signature: None,
        }
    }

    #[test]
    fn test_new_entry_pending() {
        let env = sample_envelope();
        let entry = QueueEntry::new(env, "https://bob.example/ai2ai".to_string(), 0);
        assert_eq!(entry.status, QueueStatus::Pending);
        assert_eq!(entry.attempts, 0);
    }

    #[test]
    fn test_record_failure_increments_attempts() {
        let env = sample_envelope();
        let mut entry = QueueEntry::new(env, "https://bob.example/ai2ai".to_string(), 0);
        entry.record_failure("connection refused".to_string(), Utc::now());
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.status, QueueStatus::Retrying);
        assert!(entry.last_error.is_some());
    }

    #[test]
    fn test_dlq_entry_from_queue_entry() {
        let env = sample_envelope();
        let mut entry = QueueEntry::new(env, "https://bob.example/ai2ai".to_string(), 0);
        entry.record_failure("timeout".to_string(), Utc::now());
        entry.record_failure("timeout".to_string(), Utc::now());
        let dlq = DlqEntry::from_queue_entry(entry, "retry budget exhausted".to_string());
        assert_eq!(dlq.attempts, 2);
        assert_eq!(dlq.error, "retry budget exhausted");
    }

    #[test]
    fn test_is_expired() {
        let mut env = sample_envelope();
        env.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        let entry = QueueEntry::new(env, "https://bob.example/ai2ai".to_string(), 0);
        assert!(entry.is_expired(Utc::now()));
    }
}
