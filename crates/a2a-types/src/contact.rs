//! Peer contact records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How much a node trusts a contact. Defaults to `None`; transitions require
/// explicit operator action — a node never promotes trust on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    #[default]
    None,
    Known,
    Trusted,
}

/// A previously-rotated-out Ed25519 public key, kept so signatures made
/// shortly before a key rotation still verify during the grace window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousKey {
    pub ed_public_key: String,
    pub retired_at: DateTime<Utc>,
}

/// A peer record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub agent_id: String,
    pub human_name: String,
    pub endpoint: String,
    /// Base64-encoded Ed25519 public key.
    pub ed_public_key: String,
    /// Base64-encoded X25519 public key.
    pub x_public_key: String,
    #[serde(default)]
    pub trust_level: TrustLevel,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub previous_ed_keys: Vec<PreviousKey>,
}

impl Contact {
    /// True if this contact may currently exchange messages at all.
    ///
    /// `blocked` gates both inbound and outbound traffic regardless of
    /// trust level.
    pub fn is_reachable(&self) -> bool {
        !self.blocked
    }

    /// True if a first-contact message from this peer may be auto-approved.
    ///
    /// Per the approval state machine, trust level alone never authorizes
    /// auto-approval of a first contact; this always returns `false` for a
    /// contact whose `edPublicKey` has not yet been recorded from a prior
    /// exchange. Call sites that already know the contact is not first-seen
    /// should not rely on this helper.
    pub fn has_known_key(&self) -> bool {
        !self.ed_public_key.is_empty()
    }
}
