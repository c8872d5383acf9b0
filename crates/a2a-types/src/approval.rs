//! Pending human-approval records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::Envelope;

/// Approvals auto-reject if not resolved within this window.
pub const DEFAULT_APPROVAL_TTL: Duration = Duration::hours(24);

/// Resolved approvals are retained this long before being purged.
pub const RESOLVED_RETENTION: Duration = Duration::days(7);

/// A human-in-the-loop approval request, keyed by the envelope id that
/// triggered it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    /// Equal to the triggering envelope's `id`.
    pub id: Uuid,
    pub envelope: Envelope,
    /// Human-readable summary shown to the operator.
    pub approval_text: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub notified: bool,
}

impl PendingApproval {
    pub fn new(envelope: Envelope, approval_text: String) -> Self {
        Self {
            id: envelope.id,
            envelope,
            approval_text,
            created_at: Utc::now(),
            resolved: false,
            approved: None,
            human_reply: None,
            resolved_at: None,
            notified: false,
        }
    }

    /// True once `approvalTTL` has elapsed without resolution.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        !self.resolved && now >= self.created_at + DEFAULT_APPROVAL_TTL
    }

    /// True once a resolved approval has passed its 7-day retention window
    /// and should be purged from the store.
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        match self.resolved_at {
            Some(at) => self.resolved && now >= at + RESOLVED_RETENTION,
            None => false,
        }
    }

    pub fn resolve(&mut self, approved: bool, human_reply: Option<String>, at: DateTime<Utc>) {
        self.resolved = true;
        self.approved = Some(approved);
        self.human_reply = human_reply;
        self.resolved_at = Some(at);
    }
}
