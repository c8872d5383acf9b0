//! The node orchestrator: owns every store and service crate, and exposes
//! the public API a host application drives (`send`, `request`, `discover`,
//! contact/trust management, approval resolution).

use std::sync::Arc;

use a2a_delivery::{BreakerRegistry, DeliveryTracker};
use a2a_discovery::DiscoveryClient;
use a2a_security::SecurityFilters;
use a2a_store::{ApprovalStore, ConversationStore, ContactRegistry, DlqStore, KeyStore, QueueStore};
use a2a_types::envelope::EnvelopeType;
use a2a_types::{Contact, TrustLevel};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::NodeConfig;
use crate::egress::{self, SendOptions, SendOutcome};
use crate::events::{EventBus, NodeEvent, TimestampedEvent};
use crate::intent::{always_requires_approval, IntentHandler, IntentOutcome};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("unknown target {0}: no endpoint could be resolved")]
    UnresolvedTarget(String),
    #[error(transparent)]
    Store(#[from] a2a_store::StoreError),
    #[error(transparent)]
    Codec(#[from] a2a_codec::CodecError),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("approval {0} not found")]
    ApprovalNotFound(Uuid),
}

/// The orchestrator. Cheap to clone (everything inside is `Arc`-backed or a
/// plain value); a host typically keeps one `Arc<Node>` for the process.
pub struct Node {
    config: NodeConfig,
    data_dir: std::path::PathBuf,
    keys: RwLock<KeyStore>,
    contacts: ContactRegistry,
    conversations: ConversationStore,
    approvals: ApprovalStore,
    queue: QueueStore,
    dlq: DlqStore,
    security: SecurityFilters,
    breakers: BreakerRegistry,
    delivery_tracker: DeliveryTracker,
    discovery: DiscoveryClient,
    events: EventBus,
    http: reqwest::Client,
    intents: DashMap<String, Arc<dyn IntentHandler>>,
}

impl Node {
    pub fn open(config: NodeConfig, data_dir: std::path::PathBuf) -> anyhow::Result<Arc<Self>> {
        std::fs::create_dir_all(&data_dir)?;
        let keys = KeyStore::open(&data_dir)?;
        let contacts = ContactRegistry::open(&data_dir)?;
        let conversations = ConversationStore::open(&data_dir)?;
        let approvals = ApprovalStore::open(&data_dir)?;
        let queue = QueueStore::open(&data_dir)?;
        let dlq = DlqStore::open(&data_dir)?;
        let discovery = DiscoveryClient::new(config.network.registry.clone());

        Ok(Arc::new(Self {
            config,
            data_dir,
            keys: RwLock::new(keys),
            contacts,
            conversations,
            approvals,
            queue,
            dlq,
            security: SecurityFilters::new(),
            breakers: BreakerRegistry::new(),
            delivery_tracker: DeliveryTracker::new(),
            discovery,
            events: EventBus::new(),
            http: reqwest::Client::new(),
            intents: DashMap::new(),
        }))
    }

    // --- Accessors used by `egress`/`ingress` ---

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    pub fn keys(&self) -> &RwLock<KeyStore> {
        &self.keys
    }

    pub fn contacts(&self) -> &ContactRegistry {
        &self.contacts
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn approvals(&self) -> &ApprovalStore {
        &self.approvals
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn dlq(&self) -> &DlqStore {
        &self.dlq
    }

    pub fn security(&self) -> &SecurityFilters {
        &self.security
    }

    pub fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }

    pub fn delivery_tracker(&self) -> &DeliveryTracker {
        &self.delivery_tracker
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// This node's own agent id, derived from its current Ed25519 public
    /// key fingerprint. Agent ids are otherwise opaque `agent://` strings
    /// supplied by contacts; a node's own id is self-assigned from its
    /// identity name for readability.
    pub fn agent_id(&self) -> String {
        format!("agent://{}", self.config.identity.name)
    }

    /// Resolves `target_agent` to an HTTP endpoint: the contact registry
    /// first, falling back to the discovery client if configured.
    pub async fn resolve_endpoint(&self, target_agent: &str) -> Result<String, NodeError> {
        if let Some(contact) = self.contacts.get(target_agent) {
            if !contact.endpoint.is_empty() {
                return Ok(contact.endpoint);
            }
        }
        if let Some(endpoint) = self.discovery.resolve(target_agent, Utc::now()).await {
            return Ok(endpoint);
        }
        Err(NodeError::UnresolvedTarget(target_agent.to_string()))
    }

    pub fn register_intent_handler(&self, intent: impl Into<String>, handler: Arc<dyn IntentHandler>) {
        self.intents.insert(intent.into(), handler);
    }

    pub fn intent_handler(&self, intent: &str) -> Option<Arc<dyn IntentHandler>> {
        self.intents.get(intent).map(|entry| entry.clone())
    }

    pub fn supported_intents(&self) -> Vec<String> {
        self.intents.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Arc<TimestampedEvent>> {
        self.events.subscribe()
    }

    // --- Public API ---

    pub async fn send(&self, target_agent: &str, message: Value, opts: SendOptions) -> Result<SendOutcome, NodeError> {
        egress::send(self, target_agent, EnvelopeType::Message, None, message, false, opts).await
    }

    pub async fn request(
        &self,
        target_agent: &str,
        intent: &str,
        payload: Value,
        opts: SendOptions,
    ) -> Result<SendOutcome, NodeError> {
        egress::send(self, target_agent, EnvelopeType::Request, Some(intent.to_string()), payload, false, opts).await
    }

    pub async fn discover(&self, agent_id: &str) -> Option<String> {
        self.discovery.resolve(agent_id, Utc::now()).await
    }

    pub fn add_contact(&self, contact: Contact) -> Result<(), NodeError> {
        self.contacts.upsert(contact).map_err(NodeError::Store)
    }

    pub fn get_contact(&self, agent_id: &str) -> Option<Contact> {
        self.contacts.get(agent_id)
    }

    pub fn block(&self, agent_id: &str) -> Result<(), NodeError> {
        self.contacts.block(agent_id).map_err(NodeError::Store)
    }

    pub fn unblock(&self, agent_id: &str) -> Result<(), NodeError> {
        self.contacts.unblock(agent_id).map_err(NodeError::Store)
    }

    pub fn set_trust(&self, agent_id: &str, trust: TrustLevel) -> Result<(), NodeError> {
        self.contacts.set_trust(agent_id, trust).map_err(NodeError::Store)
    }

    /// Resolves a pending approval. `approved = true` dispatches to the
    /// registered intent handler (if any) and emits a `response` envelope
    /// back to the requester; `false` emits a `reject` envelope.
    pub async fn approve(&self, approval_id: Uuid, reply: Option<Value>) -> Result<SendOutcome, NodeError> {
        self.resolve_approval(approval_id, true, reply).await
    }

    pub async fn reject(&self, approval_id: Uuid, reason: Option<String>) -> Result<SendOutcome, NodeError> {
        let payload = reason.map(Value::String);
        self.resolve_approval(approval_id, false, payload).await
    }

    async fn resolve_approval(
        &self,
        approval_id: Uuid,
        approved: bool,
        human_reply: Option<Value>,
    ) -> Result<SendOutcome, NodeError> {
        let mut approval = self
            .approvals
            .get(approval_id)?
            .ok_or(NodeError::ApprovalNotFound(approval_id))?;

        approval.resolve(approved, human_reply.as_ref().map(|v| v.to_string()), Utc::now());
        self.approvals.save(&approval)?;

        let intent = approval.envelope.intent.clone();
        let (envelope_type, payload) = if approved {
            match intent.as_deref().and_then(|i| self.intent_handler(i)) {
                Some(handler) => {
                    let request_payload = approval.envelope.payload.as_value();
                    let handler_input = merge_operator_reply(request_payload, human_reply.clone());
                    outcome_to_reply(handler.handle(&approval.envelope.from.agent, &handler_input))
                }
                None => (EnvelopeType::Response, human_reply.unwrap_or(Value::Null)),
            }
        } else {
            (EnvelopeType::Reject, human_reply.unwrap_or(Value::Null))
        };

        let opts = SendOptions { conversation: Some(approval.envelope.conversation), ..Default::default() };
        egress::send(self, &approval.envelope.from.agent, envelope_type, intent, payload, false, opts).await
    }

    /// Dispatches an inbound `request` to its handler, deciding between
    /// direct dispatch and an approval gate: the commerce guard always
    /// wins over trust, and an untrusted sender always requires approval.
    pub fn route_request(&self, from_agent: &str, intent: &str) -> RequestRoute {
        if always_requires_approval(intent) {
            return RequestRoute::RequiresApproval;
        }
        let trust = self.contacts.get(from_agent).map(|c| c.trust_level).unwrap_or_default();
        if trust != TrustLevel::Trusted {
            return RequestRoute::RequiresApproval;
        }
        match self.intent_handler(intent) {
            Some(handler) => RequestRoute::Dispatch(handler),
            None => RequestRoute::Unsupported,
        }
    }

    pub async fn run_maintenance_sweep(&self) -> Result<crate::conversation_machine::SweepReport, NodeError> {
        self.security.sweep(Utc::now());
        let report = crate::conversation_machine::sweep(&self.conversations, &self.approvals, Utc::now())
            .map_err(|e| NodeError::Delivery(e.to_string()))?;
        for approval_id in &report.expired_approval_ids {
            self.events.emit(NodeEvent::ApprovalExpired { approval_id: *approval_id });
        }
        Ok(report)
    }

    /// Rotates the signing key if `rotationInterval` has elapsed, then
    /// best-effort broadcasts a `key_rotation` envelope to every known,
    /// unblocked contact. A contact that is unreachable right now will pick
    /// up the new key on its next signature-verification attempt anyway,
    /// since verifiers accept the previous key for a few rotations.
    pub async fn rotate_keys_if_needed(&self) -> Result<bool, NodeError> {
        let rotation_interval = chrono::Duration::days(self.config.security.rotation_interval_days);
        let needs_rotation = self.keys.read().await.needs_rotation(Utc::now(), rotation_interval);
        if !needs_rotation {
            return Ok(false);
        }

        let result = self.keys.write().await.rotate()?;

        for contact in self.contacts.all() {
            if contact.blocked {
                continue;
            }
            let payload = serde_json::json!({
                "newPublicKey": result.new_public_key.to_base64(),
                "previousPublicKey": result.previous_public_key.to_base64(),
            });
            let opts = SendOptions::default();
            if let Err(e) = egress::send(self, &contact.agent_id, EnvelopeType::KeyRotation, None, payload, false, opts).await {
                tracing::warn!(contact = %contact.agent_id, error = %e, "failed to notify contact of key rotation");
            }
        }

        Ok(true)
    }
}

pub enum RequestRoute {
    Dispatch(Arc<dyn IntentHandler>),
    RequiresApproval,
    Unsupported,
}

/// Turns a handler's [`IntentOutcome`] into the envelope type and payload
/// of the reply the orchestrator sends back.
pub fn outcome_to_reply(outcome: IntentOutcome) -> (EnvelopeType, Value) {
    match outcome {
        IntentOutcome::Approved(value) => (EnvelopeType::Response, value),
        IntentOutcome::Rejected(reason) => (EnvelopeType::Reject, Value::String(reason)),
        IntentOutcome::Counter(value) => (EnvelopeType::Response, value),
    }
}

/// Folds the operator's approval-time reply into the original request
/// payload before handing it to the intent handler, so a handler can use
/// the reply to pick among the terms it originally proposed (e.g. an
/// index into a `proposedTimes` list).
fn merge_operator_reply(request_payload: Value, reply: Option<Value>) -> Value {
    let Some(reply) = reply else { return request_payload };
    match request_payload {
        Value::Object(mut map) => {
            map.insert("operatorReply".to_string(), reply);
            Value::Object(map)
        }
        other => serde_json::json!({ "request": other, "operatorReply": reply }),
    }
}
