//! Integration test: ping handshake.
//!
//! 1. Node A knows Node B's endpoint but has never exchanged keys with it.
//! 2. A pings B over real loopback HTTP.
//! 3. B replies synchronously with its capabilities and current keys.
//! 4. A's contact registry now carries B's Ed25519 key, fingerprint, and
//!    X25519 key without any prior `add_contact` call supplying them.

use a2a_integration_tests::spawn_node;
use a2a_node::egress::{self, SendOptions};
use a2a_types::envelope::EnvelopeType;
use a2a_types::{Contact, TrustLevel};

#[tokio::test]
async fn ping_learns_peer_keys_into_contact_registry() {
    // =========================================================
    // Step 1: spin up two nodes, A only knowing B's address
    // =========================================================
    let a = spawn_node("alice").await;
    let b = spawn_node("bob").await;

    a.node
        .add_contact(Contact {
            agent_id: b.agent_id(),
            human_name: String::new(),
            endpoint: b.endpoint(),
            ed_public_key: String::new(),
            x_public_key: String::new(),
            trust_level: TrustLevel::None,
            blocked: false,
            capabilities: vec![],
            timezone: None,
            last_seen: None,
            previous_ed_keys: vec![],
        })
        .expect("a records b's address");

    assert!(!a.node.get_contact(&b.agent_id()).expect("contact recorded").has_known_key());

    // =========================================================
    // Step 2: A pings B
    // =========================================================
    let outcome = egress::send(&a.node, &b.agent_id(), EnvelopeType::Ping, None, serde_json::Value::Null, false, SendOptions::default())
        .await
        .expect("ping delivers");
    assert!(matches!(outcome, a2a_node::egress::SendOutcome::Sent { .. }));

    // =========================================================
    // Step 3: A's contact registry learned B's keys
    // =========================================================
    let learned = a.node.get_contact(&b.agent_id()).expect("contact still present");
    assert!(learned.has_known_key(), "ed25519 key must be learned from the ping response");
    assert!(!learned.x_public_key.is_empty(), "x25519 key must be learned from the ping response");

    let b_keys = b.node.keys().read().await;
    assert_eq!(learned.ed_public_key, b_keys.verifying_key().to_base64());
    assert_eq!(learned.x_public_key, b_keys.agreement_public_key().to_base64());

    // Trust is never granted implicitly by a ping.
    assert_eq!(learned.trust_level, TrustLevel::None);
}
