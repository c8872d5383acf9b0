//! Integration test: replay-attack rejection.
//!
//! The same signed envelope (same sender, same nonce) posted twice to a
//! node's ingress endpoint is accepted the first time and rejected the
//! second, before signature verification ever runs a second time.

use a2a_integration_tests::{introduce, spawn_node};
use a2a_types::envelope::{EnvelopeType, From, Payload, To};
use a2a_types::Envelope;
use chrono::Utc;
use uuid::Uuid;

#[tokio::test]
async fn duplicate_nonce_is_rejected_on_second_delivery() {
    // =========================================================
    // Step 1: introduce A and B so B can verify A's signature
    // =========================================================
    let a = spawn_node("alice").await;
    let b = spawn_node("bob").await;
    introduce(&a, &b).await;

    // =========================================================
    // Step 2: hand-build and sign one envelope from A to B
    // =========================================================
    let mut envelope = Envelope {
        proto_version: a2a_types::envelope::PROTO_VERSION.to_string(),
        id: Uuid::new_v4(),
        nonce: "fixed-replay-nonce".to_string(),
        timestamp: Utc::now(),
        expires_at: None,
        from: From { agent: a.agent_id(), human: "Alice operator".to_string() },
        to: To { agent: b.agent_id() },
        conversation: Uuid::new_v4(),
        envelope_type: EnvelopeType::Message,
        intent: None,
        payload: Payload::Plain(serde_json::json!({ "text": "hello" })),
        requires_human_approval: false,
        signature: None,
    };
    {
        let keys = a.node.keys().read().await;
        a2a_codec::sign(&mut envelope, keys.signing_key()).expect("sign");
    }

    // =========================================================
    // Step 3: post it twice to B's real HTTP endpoint
    // =========================================================
    let client = reqwest::Client::new();
    let first = client.post(b.endpoint()).json(&envelope).send().await.expect("first post");
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let first_body: serde_json::Value = first.json().await.expect("first body");
    assert_eq!(first_body["status"], "ok");

    let second = client.post(b.endpoint()).json(&envelope).send().await.expect("second post");
    assert_eq!(second.status(), reqwest::StatusCode::BAD_REQUEST);
    let second_body: serde_json::Value = second.json().await.expect("second body");
    assert_eq!(second_body["status"], "replay_detected");
}
