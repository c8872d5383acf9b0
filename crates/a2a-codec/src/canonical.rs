//! Deterministic canonicalization of the signed envelope field subset.
//!
//! The signed bytes are the JSON encoding of
//! `{id, timestamp, from, to, conversation, type, intent, payload}` with
//! keys in lexicographic order and no whitespace. `nonce`, `expiresAt`,
//! `requiresHumanApproval`, and `signature` are deliberately excluded.
//!
//! `serde_json::Map` is a `BTreeMap` in this workspace (the `preserve_order`
//! feature is never enabled), so any `Value::Object` built here — at every
//! nesting level, including `from`/`to`/`payload` — serializes with its keys
//! already in lexicographic order. Canonicalization does not need a second
//! sorting pass.

use a2a_types::Envelope;
use serde_json::{Map, Value};

use crate::{CodecError, Result};

/// Build the canonical `Value` for the signed field subset of `envelope`.
pub fn canonical_value(envelope: &Envelope) -> Result<Value> {
    let to_value = |v: serde_json::Result<Value>| v.map_err(|e| CodecError::Canonicalization(e.to_string()));

    let mut map = Map::new();
    map.insert("id".to_string(), to_value(serde_json::to_value(envelope.id))?);
    map.insert(
        "timestamp".to_string(),
        to_value(serde_json::to_value(envelope.timestamp))?,
    );
    map.insert("from".to_string(), to_value(serde_json::to_value(&envelope.from))?);
    map.insert("to".to_string(), to_value(serde_json::to_value(&envelope.to))?);
    map.insert(
        "conversation".to_string(),
        to_value(serde_json::to_value(envelope.conversation))?,
    );
    map.insert(
        "type".to_string(),
        to_value(serde_json::to_value(envelope.envelope_type))?,
    );
    map.insert(
        "intent".to_string(),
        to_value(serde_json::to_value(&envelope.intent))?,
    );
    map.insert(
        "payload".to_string(),
        to_value(serde_json::to_value(&envelope.payload))?,
    );
    Ok(Value::Object(map))
}

/// Render the canonical signed bytes for `envelope`: no whitespace, keys in
/// lexicographic order at every nesting level.
pub fn canonical_bytes(envelope: &Envelope) -> Result<Vec<u8>> {
    let value = canonical_value(envelope)?;
    serde_json::to_vec(&value).map_err(|e| CodecError::Canonicalization(e.to_string()))
}
