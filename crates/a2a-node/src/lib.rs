//! The node orchestrator crate: configuration, the event bus, the intent
//! dispatch contract, the conversation state machine, the egress/ingress
//! pipelines, the persistent-queue worker, and the `Node` type that ties
//! them together. The `a2a-node` binary (`src/main.rs`) is a thin shell
//! around this library.

pub mod config;
pub mod conversation_machine;
pub mod egress;
pub mod events;
pub mod ingress;
pub mod intent;
pub mod node;
pub mod queue_worker;

pub use config::NodeConfig;
pub use events::{EventBus, NodeEvent, TimestampedEvent};
pub use intent::{IntentHandler, IntentOutcome};
pub use node::{Node, NodeError, RequestRoute};
