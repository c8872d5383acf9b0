//! Conversation state: the negotiation lifecycle grouping related envelopes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default conversation expiry: 7 days after the last activity.
pub const DEFAULT_EXPIRY: Duration = Duration::days(7);

/// The conversation negotiation state machine (state transitions live in
/// `a2a-node`'s orchestrator; this enum only names the states).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Proposed,
    Negotiating,
    Confirmed,
    Rejected,
    Expired,
}

/// A conversation: the grouping of envelopes exchanged while negotiating a
/// single intent to a resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub state: ConversationState,
    pub intent: String,
    pub initiator: String,
    pub recipient: String,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub message_count: u64,
}

impl Conversation {
    /// Start a new conversation in the `proposed` state, expiring 7 days
    /// from now unless later bumped by activity.
    pub fn new(id: Uuid, intent: String, initiator: String, recipient: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: ConversationState::Proposed,
            intent,
            initiator: initiator.clone(),
            recipient: recipient.clone(),
            participants: vec![initiator, recipient],
            created_at: now,
            updated_at: now,
            expires_at: now + DEFAULT_EXPIRY,
            message_count: 0,
        }
    }

    /// Record a new envelope against this conversation: bump the message
    /// count, touch `updatedAt`, and push `expiresAt` out another 7 days.
    pub fn record_activity(&mut self, at: DateTime<Utc>) {
        self.message_count += 1;
        self.updated_at = at;
        self.expires_at = at + DEFAULT_EXPIRY;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ConversationState::Confirmed | ConversationState::Rejected | ConversationState::Expired
        )
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_proposed() {
        let c = Conversation::new(
            Uuid::new_v4(),
            "schedule.meeting".to_string(),
            "agent://alice.example".to_string(),
            "agent://bob.example".to_string(),
        );
        assert_eq!(c.state, ConversationState::Proposed);
        assert_eq!(c.message_count, 0);
        assert_eq!(c.participants.len(), 2);
    }

    #[test]
    fn test_record_activity_bumps_count_and_expiry() {
        let mut c = Conversation::new(
            Uuid::new_v4(),
            "schedule.meeting".to_string(),
            "agent://alice.example".to_string(),
            "agent://bob.example".to_string(),
        );
        let before_expiry = c.expires_at;
        c.record_activity(Utc::now() + Duration::days(1));
        assert_eq!(c.message_count, 1);
        assert!(c.expires_at > before_expiry);
    }

    #[test]
    fn test_terminal_states() {
        let mut c = Conversation::new(
            Uuid::new_v4(),
            "schedule.meeting".to_string(),
            "agent://alice.example".to_string(),
            "agent://bob.example".to_string(),
        );
        assert!(!c.is_terminal());
        c.state = ConversationState::Confirmed;
        assert!(c.is_terminal());
        c.state = ConversationState::Negotiating;
        assert!(!c.is_terminal());
    }

    #[test]
    fn test_is_expired() {
        let c = Conversation::new(
            Uuid::new_v4(),
            "schedule.meeting".to_string(),
            "agent://alice.example".to_string(),
            "agent://bob.example".to_string(),
        );
        assert!(!c.is_expired(Utc::now()));
        assert!(c.is_expired(Utc::now() + Duration::days(8)));
    }
}
