//! The inbound HTTP surface: `GET /ai2ai/health`, `GET
//! /.well-known/ai2ai.json`, and `POST /ai2ai`.
//!
//! `POST /ai2ai` runs every inbound envelope through the security filter
//! chain before any application-level routing happens.

use std::sync::Arc;

use a2a_crypto::ed25519::VerifyingKey;
use a2a_types::envelope::{EnvelopeType, ReceiptPayload};
use a2a_types::{Conversation, ConversationState, Contact, Envelope, PendingApproval};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Duration;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::limit::RequestBodyLimitLayer;

use crate::events::NodeEvent;
use crate::intent::IntentOutcome;
use crate::node::{outcome_to_reply, Node, RequestRoute};

/// `POST /ai2ai` request bodies are capped at 100KB; larger bodies never
/// reach the handler (tower_http rejects with 413 first).
const MAX_BODY_BYTES: usize = 100 * 1024;

#[derive(Debug, Serialize)]
struct IngressResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<uuid::Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation: Option<uuid::Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl IngressResponse {
    fn ok() -> Self {
        Self { status: "ok".to_string(), id: None, reason: None, conversation: None, payload: None }
    }

    fn with_status(status: &str) -> Self {
        Self { status: status.to_string(), ..Self::ok() }
    }
}

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/ai2ai/health", get(health_handler))
        .route("/.well-known/ai2ai.json", get(well_known_handler))
        .route("/ai2ai", post(ingress_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(node)
}

async fn health_handler(State(node): State<Arc<Node>>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "protocol": a2a_types::envelope::PROTO_VERSION,
        "agent": node.agent_id(),
        "intents": node.supported_intents(),
    }))
}

async fn well_known_handler(State(node): State<Arc<Node>>) -> Json<Value> {
    let keys = node.keys().read().await;
    Json(json!({
        "ai2ai": a2a_types::envelope::PROTO_VERSION,
        "endpoint": format!("http://{}:{}/ai2ai", "localhost", node.config().network.port),
        "agent": node.agent_id(),
        "human": node.config().identity.human_name,
        "publicKey": keys.verifying_key().to_base64(),
        "fingerprint": keys.fingerprint(),
        "capabilities": node.supported_intents(),
    }))
}

async fn ingress_handler(State(node): State<Arc<Node>>, Json(envelope): Json<Envelope>) -> Response {
    match process_envelope(&node, envelope).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(rejection) => (rejection.status, Json(rejection.body)).into_response(),
    }
}

struct Rejection {
    status: StatusCode,
    body: IngressResponse,
}

fn rejection(status: StatusCode, reason: &str) -> Rejection {
    Rejection { status, body: IngressResponse::with_status(reason) }
}

/// Logs the real store error for operators but never puts it on the wire.
fn internal_error(error: impl std::fmt::Display) -> Rejection {
    tracing::error!(error = %error, "ingress handler store error");
    rejection(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}

fn candidate_keys(contact: Option<&Contact>) -> Vec<VerifyingKey> {
    let Some(contact) = contact else { return Vec::new() };
    let mut keys = Vec::new();
    if let Ok(key) = VerifyingKey::from_base64(&contact.ed_public_key) {
        keys.push(key);
    }
    for previous in &contact.previous_ed_keys {
        if let Ok(key) = VerifyingKey::from_base64(&previous.ed_public_key) {
            keys.push(key);
        }
    }
    keys
}

async fn process_envelope(node: &Node, mut envelope: Envelope) -> Result<IngressResponse, Rejection> {
    let now = chrono::Utc::now();
    let contact = node.contacts().get(&envelope.from.agent);
    let is_blocked = node.contacts().is_blocked(&envelope.from.agent);
    let message_ttl = Duration::milliseconds(node.config().security.message_ttl_ms as i64);
    let keys = candidate_keys(contact.as_ref());

    let outcome = node
        .security()
        .check_inbound(&envelope, now, is_blocked, &node.config().security.accepted_versions, message_ttl, &keys)
        .map_err(security_error_to_rejection)?;

    if outcome == a2a_security::FilterOutcome::Duplicate {
        return Ok(IngressResponse::with_status("duplicate"));
    }

    if matches!(envelope.payload, a2a_types::envelope::Payload::Encrypted(_)) {
        let node_keys = node.keys().read().await;
        let plaintext = a2a_codec::decrypt_payload(node_keys.agreement_secret(), &envelope.payload)
            .map_err(|_| rejection(StatusCode::BAD_REQUEST, "decryption_failed"))?;
        envelope.payload = a2a_types::envelope::Payload::Plain(plaintext);
    }

    let mut conversation = node
        .conversations()
        .get(envelope.conversation)
        .map_err(internal_error)?
        .unwrap_or_else(|| {
            Conversation::new(
                envelope.conversation,
                envelope.intent.clone().unwrap_or_default(),
                envelope.from.agent.clone(),
                envelope.to.agent.clone(),
            )
        });
    conversation.record_activity(now);
    node.conversations()
        .save(&conversation)
        .map_err(internal_error)?;
    node.conversations()
        .append_envelope(envelope.conversation, &envelope)
        .map_err(internal_error)?;

    route_by_type(node, envelope, conversation).await
}

async fn route_by_type(node: &Node, envelope: Envelope, conversation: Conversation) -> Result<IngressResponse, Rejection> {
    match envelope.envelope_type {
        EnvelopeType::Ping => {
            let keys = node.keys().read().await;
            Ok(IngressResponse {
                payload: Some(json!({
                    "type": "ping",
                    "agent": node.agent_id(),
                    "capabilities": node.supported_intents(),
                    "publicKey": keys.verifying_key().to_base64(),
                    "xPublicKey": keys.agreement_public_key().to_base64(),
                })),
                ..IngressResponse::ok()
            })
        }
        EnvelopeType::Request => route_request(node, envelope).await,
        EnvelopeType::Response | EnvelopeType::Confirm | EnvelopeType::Reject => {
            route_negotiation(node, envelope, conversation)
        }
        EnvelopeType::Message => {
            node.events().emit(NodeEvent::from_conversation_activity(&conversation, envelope.id));
            Ok(IngressResponse::ok())
        }
        EnvelopeType::Receipt => route_receipt(node, envelope),
        EnvelopeType::KeyRotation => Ok(IngressResponse::ok()),
    }
}

async fn route_request(node: &Node, envelope: Envelope) -> Result<IngressResponse, Rejection> {
    let intent = envelope.intent.clone().unwrap_or_default();

    match node.route_request(&envelope.from.agent, &intent) {
        RequestRoute::Unsupported => Ok(IngressResponse {
            payload: Some(json!({ "error": "unsupported intent", "supported_intents": node.supported_intents() })),
            ..IngressResponse::ok()
        }),
        RequestRoute::RequiresApproval => {
            let payload_json = payload_as_value(&envelope);
            let approval = PendingApproval::new(envelope.clone(), format!("Approve {intent} from {}?", envelope.from.agent));
            node.approvals()
                .save(&approval)
                .map_err(internal_error)?;
            node.events().emit(NodeEvent::from_approval(&approval));
            let _ = payload_json;
            Ok(IngressResponse {
                conversation: Some(envelope.conversation),
                ..IngressResponse::with_status("pending_approval")
            })
        }
        RequestRoute::Dispatch(handler) => {
            let payload_json = payload_as_value(&envelope);
            let outcome = handler.handle(&envelope.from.agent, &payload_json);
            let (_, reply_payload) = outcome_to_reply(outcome_clone(&outcome));
            node.events().emit(NodeEvent::Request {
                envelope_id: envelope.id,
                from_agent: envelope.from.agent.clone(),
                intent,
                approval: None,
            });
            Ok(IngressResponse {
                conversation: Some(envelope.conversation),
                payload: Some(reply_payload),
                ..IngressResponse::ok()
            })
        }
    }
}

/// `IntentOutcome` has no `Clone` (it carries arbitrary `Value`s that may be
/// large); this helper exists purely so the match above can both log the
/// kind and extract the reply payload from one evaluation.
fn outcome_clone(outcome: &IntentOutcome) -> IntentOutcome {
    match outcome {
        IntentOutcome::Approved(v) => IntentOutcome::Approved(v.clone()),
        IntentOutcome::Rejected(r) => IntentOutcome::Rejected(r.clone()),
        IntentOutcome::Counter(v) => IntentOutcome::Counter(v.clone()),
    }
}

fn route_negotiation(node: &Node, envelope: Envelope, _conversation: Conversation) -> Result<IngressResponse, Rejection> {
    let target_state = match envelope.envelope_type {
        EnvelopeType::Confirm => ConversationState::Confirmed,
        EnvelopeType::Reject => ConversationState::Rejected,
        _ => ConversationState::Negotiating,
    };

    match crate::conversation_machine::transition(node.conversations(), envelope.conversation, target_state, chrono::Utc::now()) {
        Ok(updated) => {
            node.events().emit(NodeEvent::Message {
                envelope_id: envelope.id,
                from_agent: envelope.from.agent.clone(),
                conversation_id: updated.id,
            });
            Ok(IngressResponse { conversation: Some(updated.id), ..IngressResponse::ok() })
        }
        Err(_) => Ok(IngressResponse::ok()),
    }
}

fn route_receipt(node: &Node, envelope: Envelope) -> Result<IngressResponse, Rejection> {
    use a2a_types::envelope::ReceiptStatus;

    let payload = payload_as_value(&envelope);
    if let Ok(receipt) = serde_json::from_value::<ReceiptPayload>(payload) {
        let applied = node.delivery_tracker().record(receipt.message_id, receipt.status, receipt.timestamp);
        if applied {
            let event = match receipt.status {
                ReceiptStatus::Delivered => Some(NodeEvent::Delivered { envelope_id: receipt.message_id }),
                ReceiptStatus::Read => Some(NodeEvent::Read { envelope_id: receipt.message_id }),
                ReceiptStatus::Failed => Some(NodeEvent::Failed { envelope_id: receipt.message_id, reason: "peer reported delivery failure".to_string() }),
                ReceiptStatus::Sent => None,
            };
            if let Some(event) = event {
                node.events().emit(event);
            }
        }
    }
    Ok(IngressResponse::ok())
}

fn payload_as_value(envelope: &Envelope) -> Value {
    envelope.payload.as_value()
}

fn security_error_to_rejection(error: a2a_security::SecurityError) -> Rejection {
    use a2a_security::SecurityError::*;
    match error {
        Blocked => rejection(StatusCode::FORBIDDEN, "blocked"),
        RateLimited => rejection(StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        MessageExpired => rejection(StatusCode::BAD_REQUEST, "message_expired"),
        ReplayDetected => rejection(StatusCode::BAD_REQUEST, "replay_detected"),
        InvalidEnvelope(_) => rejection(StatusCode::BAD_REQUEST, "invalid_envelope"),
        InvalidSignature => rejection(StatusCode::FORBIDDEN, "invalid_signature"),
    }
}
