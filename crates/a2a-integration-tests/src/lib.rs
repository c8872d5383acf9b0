//! Shared two-node test harness: spins up real `Node` instances behind
//! real axum HTTP servers on loopback ephemeral ports, so the tests in
//! `tests/` drive the actual wire protocol rather than mocking it.

use std::net::SocketAddr;
use std::sync::Arc;

use a2a_node::{ingress, Node, NodeConfig};
use a2a_types::{Contact, TrustLevel};

pub struct TestNode {
    pub node: Arc<Node>,
    pub addr: SocketAddr,
    _data_dir: tempfile::TempDir,
    _server: tokio::task::JoinHandle<()>,
}

impl TestNode {
    pub fn endpoint(&self) -> String {
        format!("http://{}/ai2ai", self.addr)
    }

    pub fn agent_id(&self) -> String {
        self.node.agent_id()
    }
}

/// Opens a fresh node in a temp data directory and serves its ingress HTTP
/// surface on an OS-assigned loopback port.
pub async fn spawn_node(name: &str) -> TestNode {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let mut config = NodeConfig::default();
    config.identity.name = name.to_string();
    config.identity.human_name = format!("{name} operator");

    let node = Node::open(config, data_dir.path().to_path_buf()).expect("open node");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let router = ingress::router(node.clone());
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    TestNode { node, addr, _data_dir: data_dir, _server: server }
}

/// Registers each node as the other's contact, mutually trusted, pointing
/// at its real loopback endpoint and current keys.
pub async fn introduce(a: &TestNode, b: &TestNode) {
    let a_contact = contact_of(a).await;
    let b_contact = contact_of(b).await;
    b.node.add_contact(a_contact).expect("b learns about a");
    a.node.add_contact(b_contact).expect("a learns about b");
}

async fn contact_of(node: &TestNode) -> Contact {
    let keys = node.node.keys().read().await;
    Contact {
        agent_id: node.agent_id(),
        human_name: node.node.config().identity.human_name.clone(),
        endpoint: node.endpoint(),
        ed_public_key: keys.verifying_key().to_base64(),
        x_public_key: keys.agreement_public_key().to_base64(),
        trust_level: TrustLevel::Trusted,
        blocked: false,
        capabilities: vec![],
        timezone: None,
        last_seen: None,
        previous_ed_keys: vec![],
    }
}
