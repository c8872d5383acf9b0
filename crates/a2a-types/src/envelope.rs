//! The wire envelope: the unit of communication between agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current protocol version stamped on outbound envelopes.
pub const PROTO_VERSION: &str = "1.0";

/// Protocol versions this node still accepts on ingress, oldest first.
pub const ACCEPTED_VERSIONS: &[&str] = &["1.0", "0.1"];

/// Sender identity attached to an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct From {
    pub agent: String,
    pub human: String,
}

/// Recipient identity attached to an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct To {
    pub agent: String,
}

/// The envelope's conversational role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    Ping,
    Message,
    Request,
    Response,
    Confirm,
    Reject,
    Receipt,
    KeyRotation,
}

/// Delivery status reported by a `receipt`-typed envelope's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

/// Payload of a `type=receipt` envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub message_id: Uuid,
    pub status: ReceiptStatus,
    pub timestamp: DateTime<Utc>,
}

/// An encrypted payload in its wire representation: the four base64 fields
/// plus the `_encrypted` discriminator that callers check before attempting
/// to parse `payload` as plain JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    #[serde(rename = "_encrypted")]
    pub encrypted: bool,
    pub ephemeral_pub: String,
    pub nonce: String,
    pub ciphertext: String,
    pub tag: String,
}

/// Either a plaintext JSON payload or an encrypted envelope.
///
/// Untagged: the wire discriminator is the presence of `_encrypted` inside
/// the object, not an external tag, so both variants deserialize from the
/// same `payload` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Encrypted(EncryptedPayload),
    Plain(serde_json::Value),
}

impl Payload {
    /// The plaintext value, if any. An envelope's encrypted payload is
    /// always replaced with its decrypted `Plain` form before it reaches
    /// application code, so `Encrypted` surviving to this call means
    /// decryption was skipped, not that it failed; callers that can see an
    /// undecrypted payload treat it as absent.
    pub fn as_value(&self) -> serde_json::Value {
        match self {
            Payload::Plain(value) => value.clone(),
            Payload::Encrypted(_) => serde_json::Value::Null,
        }
    }
}

/// The unit of communication between agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub proto_version: String,
    pub id: Uuid,
    /// Random 128-bit value, hex-encoded; the replay key, distinct from `id`.
    pub nonce: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub from: From,
    pub to: To,
    pub conversation: Uuid,
    #[serde(rename = "type")]
    pub envelope_type: EnvelopeType,
    /// Namespaced intent string (e.g. `schedule.meeting`). `None` for
    /// `ping`/`receipt` envelopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    pub payload: Payload,
    pub requires_human_approval: bool,
    /// Base64-encoded Ed25519 signature over the envelope's signed field
    /// subset. Empty until `a2a-codec::sign` fills it in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Envelope {
    /// True if `proto_version` is one this node still accepts on ingress.
    pub fn has_accepted_version(&self, accepted: &[String]) -> bool {
        accepted.iter().any(|v| v == &self.proto_version)
    }

    /// True if `payload` is the encrypted variant.
    pub fn is_encrypted(&self) -> bool {
        matches!(self.payload, Payload::Encrypted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            proto_version: PROTO_VERSION.to_string(),
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
    fn test_json_round_trip() {
        let env = sample();
        let json = serde_json::to_string(&env).expect("serialize");
        let restored: Envelope = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(env, restored);
    }

    #[test]
    fn test_camel_case_field_names() {
        let env = sample();
        let json = serde_json::to_value(&env).expect("serialize");
        assert!(json.get("protoVersion").is_some());
        assert!(json.get("requiresHumanApproval").is_some());
        assert!(json.get("type").is_some());
    }

    #[test]
    fn test_ping_has_no_intent() {
        let mut env = sample();
        env.envelope_type = EnvelopeType::Ping;
        env.intent = None;
        let json = serde_json::to_value(&env).expect("serialize");
        assert!(json.get("intent").is_none());
    }

    #[test]
    fn test_encrypted_payload_round_trip() {
        let mut env = sample();
        env.payload = Payload::Encrypted(EncryptedPayload {
            encrypted: true,
            ephemeral_pub: "ZWVl".to_string(),
            nonce: "bm9u".to_string(),
            ciphertext: "Y3Q=".to_string(),
            tag: "dGFn".to_string(),
        });
        assert!(env.is_encrypted());

        let json = serde_json::to_string(&env).expect("serialize");
        let restored: Envelope = serde_json::from_str(&json).expect("deserialize");
        assert!(restored.is_encrypted());
    }

    #[test]
    fn test_has_accepted_version() {
        let env = sample();
        let accepted = vec!["1.0".to_string(), "0.1".to_string()];
        assert!(env.has_accepted_version(&accepted));

        let rejected = vec!["2.0".to_string()];
        assert!(!env.has_accepted_version(&rejected));
    }

    #[test]
    fn test_receipt_payload_round_trip() {
        let payload = ReceiptPayload {
            message_id: Uuid::new_v4(),
            status: ReceiptStatus::Delivered,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&payload).expect("serialize");
        let restored: ReceiptPayload = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(payload, restored);
    }
}
