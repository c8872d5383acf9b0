//! # a2a-security
//!
//! The inbound security filter chain: blocklist, rate limiting, expiry,
//! replay detection, shape validation, signature verification, and
//! deduplication, applied in a fixed, normative order to every envelope a
//! node receives over its ingress endpoint.
//!
//! ## Modules
//!
//! - [`rate_limiter`] — per-sender sliding-window rate limiting
//! - [`nonce_tracker`] — replay detection over `(sender, nonce)` pairs
//! - [`dedup_cache`] — LRU + TTL dedup over envelope ids
//! - [`verification_cache`] — LRU + TTL cache of signature verification
//!   outcomes
//! - [`filter_chain`] — composes the above into the full ordered chain

pub mod dedup_cache;
pub mod filter_chain;
pub mod nonce_tracker;
pub mod rate_limiter;
pub mod verification_cache;

pub use dedup_cache::DedupCache;
pub use filter_chain::{FilterOutcome, SecurityFilters};
pub use nonce_tracker::NonceTracker;
pub use rate_limiter::RateLimiter;
pub use verification_cache::VerificationCache;

/// Reasons the filter chain rejects an inbound envelope. Each variant maps
/// to a wire-level status an ingress handler reports back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("sender is blocked")]
    Blocked,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("message expired")]
    MessageExpired,

    #[error("replay detected")]
    ReplayDetected,

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid signature")]
    InvalidSignature,
}
