//! # a2a-types
//!
//! Data model for the ai2ai agent-to-agent protocol: the wire-visible
//! [`Envelope`] and the node-local records built around it (contacts,
//! conversations, pending approvals, and the delivery queue / dead letter
//! queue entries).
//!
//! Types in this crate are intentionally dumb: they carry no behavior beyond
//! construction helpers and `serde` round-tripping. Validation, signing, and
//! encryption live in `a2a-codec`; persistence lives in `a2a-store`.

pub mod approval;
pub mod contact;
pub mod conversation;
pub mod envelope;
pub mod queue;

pub use approval::PendingApproval;
pub use contact::{Contact, TrustLevel};
pub use conversation::{Conversation, ConversationState};
pub use envelope::{Envelope, EnvelopeType, EncryptedPayload, From, ReceiptPayload, ReceiptStatus, To};
pub use queue::{DlqEntry, QueueEntry, QueueStatus};
