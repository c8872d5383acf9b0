//! Event emission: the node pushes named lifecycle events to any
//! subscribers (a CLI, a UI, an operator dashboard) over an in-process
//! broadcast channel.

use std::sync::Arc;

use a2a_delivery::CircuitState;
use a2a_types::{Conversation, PendingApproval};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A named event the orchestrator emits. Each variant corresponds to one of
/// the node's public callbacks.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum NodeEvent {
    /// An `inform`-typed envelope arrived, or a handled `request`/`response`
    /// with no more specific event applies.
    Message { envelope_id: Uuid, from_agent: String, conversation_id: Uuid },
    /// An inbound `request` envelope was dispatched to an intent handler.
    Request { envelope_id: Uuid, from_agent: String, intent: String, approval: Option<Uuid> },
    /// A `receipt` envelope updated a delivery record.
    Receipt { message_id: Uuid, status: String },
    /// An outbound envelope was handed to the delivery engine.
    Sent { envelope_id: Uuid, to_agent: String },
    /// A peer's receipt confirmed delivery.
    Delivered { envelope_id: Uuid },
    /// A peer's receipt confirmed the message was read.
    Read { envelope_id: Uuid },
    /// Delivery failed terminally (queue exhausted or interactive send
    /// gave up without queuing).
    Failed { envelope_id: Uuid, reason: String },
    /// A circuit breaker tripped open for an endpoint.
    CircuitOpen { endpoint: String },
    /// A circuit breaker closed after a successful probe.
    CircuitClosed { endpoint: String },
    /// A pending approval aged out without operator action.
    ApprovalExpired { approval_id: Uuid },
}

impl NodeEvent {
    pub fn circuit_transition(endpoint: &str, state: CircuitState) -> Option<Self> {
        match state {
            CircuitState::Open => Some(Self::CircuitOpen { endpoint: endpoint.to_string() }),
            CircuitState::Closed => Some(Self::CircuitClosed { endpoint: endpoint.to_string() }),
            CircuitState::HalfOpen => None,
        }
    }

    pub fn from_approval(approval: &PendingApproval) -> Self {
        Self::Request {
            envelope_id: approval.envelope.id,
            from_agent: approval.envelope.from.agent.clone(),
            intent: approval.envelope.intent.clone().unwrap_or_default(),
            approval: Some(approval.id),
        }
    }

    pub fn from_conversation_activity(conversation: &Conversation, envelope_id: Uuid) -> Self {
        Self::Message {
            envelope_id,
            from_agent: conversation.initiator.clone(),
            conversation_id: conversation.id,
        }
    }
}

/// Broadcasts [`NodeEvent`]s to every subscriber. Cloned handles share the
/// same channel; a node holds one instance for its lifetime.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<TimestampedEvent>>,
}

/// An event paired with the wall-clock time it was emitted, the shape
/// delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct TimestampedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: NodeEvent,
}

/// Channel capacity: a slow subscriber can lag this many events behind
/// before it starts missing them.
const DEFAULT_CAPACITY: usize = 1024;

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    /// Emit an event, timestamped now. Silently dropped if nobody is
    /// listening.
    pub fn emit(&self, event: NodeEvent) {
        let _ = self.sender.send(Arc::new(TimestampedEvent { at: Utc::now(), event }));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TimestampedEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
