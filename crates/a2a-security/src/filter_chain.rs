//! The inbound security filter chain: blocklist, rate limit, expiry, replay,
//! shape, signature, dedup — applied in this order to every envelope a node
//! receives. Any failure short-circuits the chain.
//!
//! Ordering is normative: rate-limiting runs before any cryptographic work,
//! and dedup runs after signature verification so an unverified replay can't
//! poison the dedup cache.

use a2a_crypto::ed25519::VerifyingKey;
use a2a_types::Envelope;
use chrono::{DateTime, Duration, Utc};

use crate::dedup_cache::DedupCache;
use crate::nonce_tracker::NonceTracker;
use crate::rate_limiter::RateLimiter;
use crate::verification_cache::VerificationCache;
use crate::SecurityError;

/// What the chain decided about an envelope that made it through without an
/// error. `Duplicate` still reports success to the peer (it was accepted
/// once already) but the caller must not process it a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Accepted,
    Duplicate,
}

/// Owns the mutable state shared across checks for a node: rate-limit
/// windows, seen nonces, the dedup cache, and the verification cache. One
/// instance per node, shared across all inbound requests.
pub struct SecurityFilters {
    rate_limiter: RateLimiter,
    nonce_tracker: NonceTracker,
    dedup_cache: DedupCache,
    verification_cache: VerificationCache,
}

impl Default for SecurityFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityFilters {
    pub fn new() -> Self {
        Self {
            rate_limiter: RateLimiter::default_config(),
            nonce_tracker: NonceTracker::default_config(),
            dedup_cache: DedupCache::default_config(),
            verification_cache: VerificationCache::default_config(),
        }
    }

    /// Run the full chain against an inbound envelope.
    ///
    /// `is_blocked` and `candidate_keys` are supplied by the caller (backed
    /// by a contact registry) rather than looked up here, so this crate has
    /// no dependency on `a2a-store` and stays testable without a filesystem.
    /// `candidate_keys` empty means the sender is unknown to this node; such
    /// an envelope fails signature verification rather than being
    /// auto-trusted.
    #[allow(clippy::too_many_arguments)]
    pub fn check_inbound(
        &self,
        envelope: &Envelope,
        now: DateTime<Utc>,
        is_blocked: bool,
        accepted_versions: &[String],
        message_ttl: Duration,
        candidate_keys: &[VerifyingKey],
    ) -> Result<FilterOutcome, SecurityError> {
        if is_blocked {
            return Err(SecurityError::Blocked);
        }

        if !self.rate_limiter.check(&envelope.from.agent, now) {
            return Err(SecurityError::RateLimited);
        }

        if now > envelope.timestamp + message_ttl {
            return Err(SecurityError::MessageExpired);
        }
        if let Some(expires_at) = envelope.expires_at {
            if now > expires_at {
                return Err(SecurityError::MessageExpired);
            }
        }

        if !self.nonce_tracker.check_and_record(&envelope.from.agent, &envelope.nonce, now) {
            return Err(SecurityError::ReplayDetected);
        }

        a2a_codec::validate_shape(envelope, accepted_versions)
            .map_err(|e| SecurityError::InvalidEnvelope(e.to_string()))?;

        self.verify_signature(envelope, candidate_keys, now)?;

        if self.dedup_cache.check_and_record(envelope.id, now) {
            Ok(FilterOutcome::Accepted)
        } else {
            Ok(FilterOutcome::Duplicate)
        }
    }

    fn verify_signature(
        &self,
        envelope: &Envelope,
        candidate_keys: &[VerifyingKey],
        now: DateTime<Utc>,
    ) -> Result<(), SecurityError> {
        let signature_b64 = envelope
            .signature
            .as_deref()
            .ok_or_else(|| SecurityError::InvalidEnvelope("missing signature".to_string()))?;
        // Cached against the sender's current key; a signature made with a
        // retired key always falls through to a full multi-key verify.
        let current_key_b64 = candidate_keys.first().map(VerifyingKey::to_base64);

        if let Some(key_b64) = &current_key_b64 {
            if let Some(cached) = self.verification_cache.get(signature_b64, key_b64, now) {
                return if cached { Ok(()) } else { Err(SecurityError::InvalidSignature) };
            }
        }

        let valid = a2a_codec::verify(envelope, candidate_keys).is_ok();
        if let Some(key_b64) = &current_key_b64 {
            self.verification_cache.record(signature_b64, key_b64, valid, now);
        }
        if valid {
            Ok(())
        } else {
            Err(SecurityError::InvalidSignature)
        }
    }

    /// Periodic housekeeping: evict idle rate-limit buckets and expired
    /// nonce entries. The dedup and verification caches self-manage via LRU
    /// capacity, so they need no sweep.
    pub fn sweep(&self, now: DateTime<Utc>) {
        self.rate_limiter.evict_idle(now);
        self.nonce_tracker.evict_expired(now);
    }
}
