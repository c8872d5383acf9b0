//! Per-sender sliding-window rate limiting, keyed on `from.agent`.
//!
//! Adapted from the token-bucket-per-key pattern used for per-IP limiting in
//! HTTP gateways, keyed here on agent id instead of source IP since the
//! protocol's abuse unit is the sender identity, not the transport address.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_WINDOW: Duration = Duration::seconds(60);

/// Sliding-window limiter: at most `limit` accepted calls per `window` per
/// key, counted over the trailing window rather than fixed buckets.
pub struct RateLimiter {
    windows: DashMap<String, Vec<DateTime<Utc>>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn default_config() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }

    /// Records a call from `agent_id` at `now` and reports whether it's
    /// within the limit. Trims timestamps outside the window first, so the
    /// count always reflects the trailing `window` only.
    pub fn check(&self, agent_id: &str, now: DateTime<Utc>) -> bool {
        let mut entry = self.windows.entry(agent_id.to_string()).or_default();
        entry.retain(|t| now - *t <= self.window);
        if entry.len() >= self.limit {
            false
        } else {
            entry.push(now);
            true
        }
    }

    /// Drops buckets with no timestamps left in the window. An approximation
    /// of evicting callers idle for longer than `window`; call periodically
    /// to bound memory for a long-running node with a large, churning
    /// contact set.
    pub fn evict_idle(&self, now: DateTime<Utc>) {
        self.windows.retain(|_, timestamps| {
            timestamps.retain(|t| now - *t <= self.window);
            !timestamps.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::seconds(60));
        let now = Utc::now();
        assert!(limiter.check("agent://alice.example", now));
        assert!(limiter.check("agent://alice.example", now));
        assert!(limiter.check("agent://alice.example", now));
        assert!(!limiter.check("agent://alice.example", now));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::seconds(60));
        let now = Utc::now();
        assert!(limiter.check("agent://alice.example", now));
        assert!(limiter.check("agent://bob.example", now));
    }

    #[test]
    fn test_window_expiry_allows_more() {
        let limiter = RateLimiter::new(1, Duration::seconds(60));
        let now = Utc::now();
        assert!(limiter.check("agent://alice.example", now));
        assert!(!limiter.check("agent://alice.example", now));
        assert!(limiter.check("agent://alice.example", now + Duration::seconds(61)));
    }

    #[test]
    fn test_evict_idle_removes_empty_buckets() {
        let limiter = RateLimiter::new(5, Duration::seconds(60));
        let now = Utc::now();
        limiter.check("agent://alice.example", now);
        limiter.evict_idle(now + Duration::seconds(61));
        assert_eq!(limiter.windows.len(), 0);
    }
}
