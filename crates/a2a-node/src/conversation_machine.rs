//! Conversation state transitions and the periodic maintenance sweep.
//!
//! The allowed transitions:
//!
//! ```text
//! proposed    -> negotiating | confirmed | rejected | expired
//! negotiating -> confirmed | rejected | expired
//! confirmed   -> (terminal)
//! rejected    -> (terminal)
//! expired     -> (terminal)
//! ```
//!
//! An invalid transition is reported as an error and leaves the stored
//! conversation untouched.

use a2a_store::{ApprovalStore, ConversationStore};
use a2a_types::{Conversation, ConversationState};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("cannot transition conversation from {from:?} to {to:?}")]
    Invalid { from: ConversationState, to: ConversationState },
    #[error(transparent)]
    Store(#[from] a2a_store::StoreError),
    #[error("conversation not found")]
    NotFound,
}

fn allowed(from: ConversationState, to: ConversationState) -> bool {
    use ConversationState::*;
    matches!(
        (from, to),
        (Proposed, Negotiating) | (Proposed, Confirmed) | (Proposed, Rejected) | (Proposed, Expired)
            | (Negotiating, Confirmed) | (Negotiating, Rejected) | (Negotiating, Expired)
    )
}

/// Apply a transition, persisting the result if allowed.
pub fn transition(
    store: &ConversationStore,
    conversation_id: uuid::Uuid,
    to: ConversationState,
    at: DateTime<Utc>,
) -> Result<Conversation, TransitionError> {
    let mut conversation = store.get(conversation_id)?.ok_or(TransitionError::NotFound)?;
    if !allowed(conversation.state, to) {
        return Err(TransitionError::Invalid { from: conversation.state, to });
    }
    conversation.state = to;
    conversation.record_activity(at);
    store.save(&conversation)?;
    Ok(conversation)
}

/// Outcome of one maintenance pass, for logging and event emission.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub conversations_expired: usize,
    pub approvals_auto_rejected: usize,
    pub approvals_purged: usize,
    pub expired_approval_ids: Vec<uuid::Uuid>,
}

/// Expire stale non-terminal conversations, auto-reject pending approvals
/// past their TTL, and purge resolved approvals past their retention
/// window. Run on a timer (default hourly per the node's advanced config).
pub fn sweep(
    conversations: &ConversationStore,
    approvals: &ApprovalStore,
    now: DateTime<Utc>,
) -> Result<SweepReport, TransitionError> {
    let mut report = SweepReport::default();

    for conversation in conversations.all()? {
        if !conversation.is_terminal() && conversation.is_expired(now) {
            transition(conversations, conversation.id, ConversationState::Expired, now)?;
            report.conversations_expired += 1;
        }
    }

    for mut approval in approvals.all()? {
        if approval.is_stale(now) {
            approval.resolve(false, None, now);
            approvals.save(&approval)?;
            report.approvals_auto_rejected += 1;
            report.expired_approval_ids.push(approval.id);
        }
    }

    report.approvals_purged = approvals.sweep_purgeable()?;

    Ok(report)
}
