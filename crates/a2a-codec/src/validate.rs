//! Structural envelope checks independent of security policy.
//!
//! Replay, expiry, blocklist, and rate-limit checks belong to the security
//! filter chain (`a2a-security`) — these checks are the ones that make an
//! envelope malformed regardless of who sent it or when.

use a2a_types::envelope::{EnvelopeType, Payload, ReceiptPayload};
use a2a_types::Envelope;

use crate::{CodecError, Result};

/// Check the subset of shape invariants the type system cannot already
/// guarantee: a non-empty nonce, a non-empty `to.agent`, and — for
/// `type=receipt` envelopes with a plaintext payload — that the payload
/// matches the receipt shape.
pub fn validate_shape(envelope: &Envelope, accepted_versions: &[String]) -> Result<()> {
    if !envelope.has_accepted_version(accepted_versions) {
        return Err(CodecError::InvalidEnvelope(format!(
            "unsupported protoVersion: {}",
            envelope.proto_version
        )));
    }
    if envelope.nonce.is_empty() {
        return Err(CodecError::InvalidEnvelope("nonce must not be empty".to_string()));
    }
    if envelope.from.agent.is_empty() {
        return Err(CodecError::InvalidEnvelope("from.agent must not be empty".to_string()));
    }
    if envelope.to.agent.is_empty() {
        return Err(CodecError::InvalidEnvelope("to.agent must not be empty".to_string()));
    }
    if matches!(envelope.envelope_type, EnvelopeType::Ping | EnvelopeType::Receipt) && envelope.intent.is_some() {
        return Err(CodecError::InvalidEnvelope(
            "intent must be absent for ping/receipt envelopes".to_string(),
        ));
    }
    if envelope.envelope_type == EnvelopeType::Receipt {
        if let Payload::Plain(value) = &envelope.payload {
            serde_json::from_value::<ReceiptPayload>(value.clone())
                .map_err(|e| CodecError::InvalidEnvelope(format!("malformed receipt payload: {e}")))?;
        }
    }
    Ok(())
}
