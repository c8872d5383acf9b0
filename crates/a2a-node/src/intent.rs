//! Application-level handlers for inbound `request` envelopes.
//!
//! A handler owns the business logic for one namespaced intent (e.g.
//! `schedule.meeting`). The orchestrator decides whether a request reaches a
//! handler at all — trust level and the commerce guard run first — and
//! turns the handler's [`IntentOutcome`] into the appropriate outbound
//! envelope type.

use serde_json::Value;

/// What a handler decided about one inbound request.
pub enum IntentOutcome {
    /// Accept it; the value becomes the payload of a `response` envelope.
    Approved(Value),
    /// Decline it; the string becomes the payload of a `reject` envelope.
    Rejected(String),
    /// Propose different terms; the value becomes the payload of a
    /// `response` envelope that still requires negotiation.
    Counter(Value),
}

/// Implemented per supported intent and registered with the node under that
/// intent's name.
pub trait IntentHandler: Send + Sync {
    fn handle(&self, from_agent: &str, payload: &Value) -> IntentOutcome;
}

/// Intent prefixes that always require human approval, regardless of the
/// sender's trust level. Matched by prefix so `commerce.purchase`,
/// `commerce.refund`, etc. are all covered.
pub const ALWAYS_REQUIRES_APPROVAL: &[&str] = &["commerce."];

pub fn always_requires_approval(intent: &str) -> bool {
    ALWAYS_REQUIRES_APPROVAL.iter().any(|prefix| intent.starts_with(prefix))
}
