//! # a2a-store
//!
//! File-based, one-JSON-document-per-entry persistence for a node's durable
//! state: its own keys, its contact and block lists, its conversation log,
//! and its outbound delivery queue and dead-letter queue.
//!
//! Every write goes through [`fs_store::write_atomic_json`]: serialize to a
//! `.tmp` sibling, then rename over the target. A reader never observes a
//! partially-written file. Concurrent writers to the same logical store are
//! serialized by an in-process lock held by the owning struct; concurrent
//! writers to the same file from different processes are out of scope (the
//! data directory is process-private).
//!
//! ## Modules
//!
//! - [`fs_store`] — shared write-then-rename / read helpers
//! - [`key_store`] — node identity keys and rotation history
//! - [`contact_registry`] — the contact map and blocklist
//! - [`conversation_store`] — conversation metadata and append log
//! - [`approval_store`] — pending human-approval records
//! - [`queue_store`] — persistent outbound queue
//! - [`dlq_store`] — dead-letter queue

pub mod approval_store;
pub mod contact_registry;
pub mod conversation_store;
pub mod dlq_store;
pub mod fs_store;
pub mod key_store;
pub mod queue_store;

pub use approval_store::ApprovalStore;
pub use contact_registry::ContactRegistry;
pub use conversation_store::ConversationStore;
pub use dlq_store::DlqStore;
pub use key_store::KeyStore;
pub use queue_store::QueueStore;

/// Errors surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
