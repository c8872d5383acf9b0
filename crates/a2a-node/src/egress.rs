//! The outbound send pipeline: resolve an endpoint, build and optionally
//! encrypt an envelope, sign it, and hand it to the delivery engine —
//! falling back to the persistent queue on terminal interactive failure.

use std::time::Duration as StdDuration;

use a2a_crypto::x25519::X25519PublicKey;
use a2a_types::envelope::{EnvelopeType, From, Payload, To};
use a2a_types::{Conversation, ConversationState, Envelope, QueueEntry};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde_json::Value;
use uuid::Uuid;

use crate::events::NodeEvent;
use crate::node::{Node, NodeError};

/// Caller-supplied knobs for one outbound send.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub ttl: Option<Duration>,
    pub priority: u8,
    /// Reuses an existing conversation instead of starting a new one.
    pub conversation: Option<Uuid>,
}

/// What happened to one outbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Delivered (or at least accepted by the peer's HTTP endpoint) on the
    /// interactive path.
    Sent { id: Uuid },
    /// The interactive path exhausted its retries; the envelope now lives
    /// in the persistent queue.
    Queued { id: Uuid },
}

fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Runs the five-step egress pipeline for one outbound envelope.
#[allow(clippy::too_many_arguments)]
pub async fn send(
    node: &Node,
    target_agent: &str,
    envelope_type: EnvelopeType,
    intent: Option<String>,
    payload: Value,
    requires_human_approval: bool,
    opts: SendOptions,
) -> Result<SendOutcome, NodeError> {
    let endpoint = node.resolve_endpoint(target_agent).await?;

    let now = Utc::now();
    let id = Uuid::new_v4();
    let conversation = opts.conversation.unwrap_or_else(Uuid::new_v4);

    let mut envelope = Envelope {
        proto_version: a2a_types::envelope::PROTO_VERSION.to_string(),
        id,
        nonce: random_nonce(),
        timestamp: now,
        expires_at: opts.ttl.map(|ttl| now + ttl),
        from: From { agent: node.agent_id(), human: node.config().identity.human_name.clone() },
        to: To { agent: target_agent.to_string() },
        conversation,
        envelope_type,
        intent,
        payload: Payload::Plain(payload),
        requires_human_approval,
        signature: None,
    };

    if node.config().advanced.encryption_enabled {
        if let Some(contact) = node.contacts().get(target_agent) {
            if !contact.x_public_key.is_empty() {
                if let Ok(x_pub) = X25519PublicKey::from_base64(&contact.x_public_key) {
                    envelope.payload = a2a_codec::encrypt_payload(&x_pub, &plain_value(&envelope.payload))
                        .map_err(NodeError::Codec)?;
                }
            }
        }
    }

    {
        let keys = node.keys().read().await;
        a2a_codec::sign(&mut envelope, keys.signing_key()).map_err(NodeError::Codec)?;
    }

    track_sender_conversation(node, &envelope)?;

    match deliver_interactive(node, &endpoint, &envelope).await {
        Ok(body) => {
            node.delivery_tracker().record(envelope.id, a2a_types::envelope::ReceiptStatus::Sent, Utc::now());
            node.events().emit(NodeEvent::Sent { envelope_id: envelope.id, to_agent: target_agent.to_string() });
            if envelope.envelope_type == EnvelopeType::Ping {
                learn_from_ping(node, target_agent, &endpoint, &body);
            }
            Ok(SendOutcome::Sent { id: envelope.id })
        }
        Err(_) => {
            let entry = QueueEntry::new(envelope.clone(), endpoint, opts.priority);
            node.queue().enqueue(&entry).map_err(NodeError::Store)?;
            Ok(SendOutcome::Queued { id: entry.id })
        }
    }
}

/// Mirrors the receiver-side conversation tracking in `ingress.rs` on the
/// initiating side: an outbound `request` proposes a conversation, and an
/// outbound `confirm` moves it to `confirmed`. Without this, the initiator's
/// own view of the conversation never leaves the default the receiver
/// assigned it, even though the initiator is the one driving the state
/// forward.
fn track_sender_conversation(node: &Node, envelope: &Envelope) -> Result<(), NodeError> {
    match envelope.envelope_type {
        EnvelopeType::Request => {
            if node.conversations().get(envelope.conversation)?.is_none() {
                let conversation = Conversation::new(
                    envelope.conversation,
                    envelope.intent.clone().unwrap_or_default(),
                    envelope.from.agent.clone(),
                    envelope.to.agent.clone(),
                );
                node.conversations().save(&conversation)?;
            }
        }
        EnvelopeType::Confirm => {
            if node.conversations().get(envelope.conversation)?.is_none() {
                let mut conversation = Conversation::new(
                    envelope.conversation,
                    envelope.intent.clone().unwrap_or_default(),
                    envelope.from.agent.clone(),
                    envelope.to.agent.clone(),
                );
                conversation.state = ConversationState::Confirmed;
                node.conversations().save(&conversation)?;
            } else {
                let _ = crate::conversation_machine::transition(
                    node.conversations(),
                    envelope.conversation,
                    ConversationState::Confirmed,
                    Utc::now(),
                );
            }
        }
        _ => {}
    }
    node.conversations().append_envelope(envelope.conversation, envelope)?;
    Ok(())
}

/// A successful ping response carries the peer's current keys; record them
/// in the contact registry so a later send can resolve and encrypt to this
/// agent without a prior explicit `add_contact` call. Trust is never
/// granted implicitly: a brand-new contact starts at the default trust
/// level, and an existing contact's trust is left untouched.
fn learn_from_ping(node: &Node, target_agent: &str, endpoint: &str, body: &Value) {
    let Some(payload) = body.get("payload") else { return };
    let Some(ed_public_key) = payload.get("publicKey").and_then(Value::as_str) else { return };
    let x_public_key = payload.get("xPublicKey").and_then(Value::as_str).unwrap_or_default();

    let mut contact = node.get_contact(target_agent).unwrap_or_else(|| a2a_types::Contact {
        agent_id: target_agent.to_string(),
        human_name: String::new(),
        endpoint: endpoint.to_string(),
        ed_public_key: String::new(),
        x_public_key: String::new(),
        trust_level: a2a_types::TrustLevel::default(),
        blocked: false,
        capabilities: vec![],
        timezone: None,
        last_seen: None,
        previous_ed_keys: vec![],
    });
    contact.endpoint = endpoint.to_string();
    contact.ed_public_key = ed_public_key.to_string();
    contact.x_public_key = x_public_key.to_string();
    contact.last_seen = Some(Utc::now());
    let _ = node.add_contact(contact);
}

/// Emits `circuit-open`/`circuit-closed` if recording the latest attempt
/// outcome actually moved the breaker's state (half-open is not reported,
/// it isn't an externally visible transition callers act on).
pub(crate) fn emit_breaker_transition(node: &Node, endpoint: &str, before: a2a_delivery::CircuitState) {
    let after = node.breakers().state_of(endpoint);
    if before != after {
        if let Some(event) = NodeEvent::circuit_transition(endpoint, after) {
            node.events().emit(event);
        }
    }
}

fn plain_value(payload: &Payload) -> Value {
    match payload {
        Payload::Plain(value) => value.clone(),
        Payload::Encrypted(_) => serde_json::Value::Null,
    }
}

/// Attempts interactive delivery with exponential backoff, honoring the
/// endpoint's circuit breaker. Returns the peer's parsed JSON response body
/// on success; returns `Err` once retries (or the breaker) are exhausted,
/// and the caller then falls back to the persistent queue.
pub async fn deliver_interactive(node: &Node, endpoint: &str, envelope: &Envelope) -> Result<Value, NodeError> {
    let policy = a2a_delivery::BackoffPolicy::interactive_default();
    let mut last_error = None;

    for attempt in 0..=policy.max_retries() {
        if !node.breakers().allow_request(endpoint, Utc::now()) {
            last_error = Some("circuit breaker open".to_string());
            break;
        }

        match deliver_once(node, endpoint, envelope).await {
            Ok(body) => {
                let before = node.breakers().state_of(endpoint);
                node.breakers().record_success(endpoint);
                emit_breaker_transition(node, endpoint, before);
                return Ok(body);
            }
            Err(e) => {
                let before = node.breakers().state_of(endpoint);
                node.breakers().record_failure(endpoint, Utc::now());
                emit_breaker_transition(node, endpoint, before);
                last_error = Some(e);
                if attempt < policy.max_retries() {
                    let delay = policy.delay_for_attempt(attempt, &mut rand::thread_rng());
                    tokio::time::sleep(StdDuration::from_millis(delay.num_milliseconds().max(0) as u64)).await;
                }
            }
        }
    }

    Err(NodeError::Delivery(last_error.unwrap_or_else(|| "delivery failed".to_string())))
}

/// Posts one envelope and returns the peer's parsed JSON response body.
/// A response body that isn't valid JSON (or is empty) is treated as
/// `Value::Null` rather than a failure — the delivery itself still
/// succeeded at the HTTP layer.
pub(crate) async fn deliver_once(node: &Node, endpoint: &str, envelope: &Envelope) -> Result<Value, String> {
    let timeout = StdDuration::from_millis(node.config().network.timeout_ms);
    let response = node
        .http_client()
        .post(endpoint)
        .header("X-AI2AI-Version", a2a_types::envelope::PROTO_VERSION)
        .json(envelope)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    } else {
        Err(format!("unexpected status {}", response.status()))
    }
}
