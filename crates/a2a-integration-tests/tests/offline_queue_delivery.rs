//! Integration test: offline peer, queued delivery, later drain.
//!
//! 1. A sends a message to a contact whose endpoint is unreachable right
//!    now; the interactive path exhausts its retries and the envelope lands
//!    in the persistent queue instead of being lost.
//! 2. The peer comes online (its real endpoint replaces the dead one in A's
//!    contact registry) and the queue worker's drain pass delivers it.

use a2a_integration_tests::spawn_node;
use a2a_node::egress::SendOptions;
use a2a_types::{Contact, TrustLevel};

#[tokio::test]
async fn queued_message_delivers_once_peer_endpoint_is_reachable() {
    // =========================================================
    // Step 1: A knows a contact at an endpoint nothing is listening on
    // =========================================================
    let a = spawn_node("alice").await;
    let bob_agent = "agent://bob.example".to_string();
    a.node
        .add_contact(Contact {
            agent_id: bob_agent.clone(),
            human_name: "Bob".to_string(),
            endpoint: "http://127.0.0.1:1/ai2ai".to_string(),
            ed_public_key: String::new(),
            x_public_key: String::new(),
            trust_level: TrustLevel::Trusted,
            blocked: false,
            capabilities: vec![],
            timezone: None,
            last_seen: None,
            previous_ed_keys: vec![],
        })
        .expect("add contact");

    // =========================================================
    // Step 2: interactive send exhausts retries and queues
    // =========================================================
    let outcome = a
        .node
        .send(&bob_agent, serde_json::json!({ "text": "are you there?" }), SendOptions::default())
        .await
        .expect("send falls back to queue rather than erroring");
    let queued_id = match outcome {
        a2a_node::egress::SendOutcome::Queued { id } => id,
        a2a_node::egress::SendOutcome::Sent { .. } => unreachable!("port 1 is unroutable, send must queue"),
    };
    assert!(a.node.queue().get(queued_id).expect("get").is_some());

    // =========================================================
    // Step 3: bob comes online at a real endpoint. The queued entry's
    // endpoint was captured at enqueue time, so re-pointing the contact
    // alone would not help an entry already sitting in the queue; a
    // rediscovery flow would rewrite the queued entry's endpoint the same
    // way, so the test does that directly.
    // =========================================================
    let b = spawn_node("bob").await;
    let mut queued = a.node.queue().get(queued_id).expect("get").expect("still queued");
    queued.endpoint = b.endpoint();
    a.node.queue().update(&queued).expect("repoint queued entry");

    a2a_node::queue_worker::drain_once(&a.node).await.expect("drain");

    assert!(a.node.queue().get(queued_id).expect("get").is_none(), "delivered entry must leave the queue");
    assert!(a.node.dlq().all().expect("dlq list").is_empty());
}
