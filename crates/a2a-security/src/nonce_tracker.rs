//! Replay detection over `(from.agent, nonce)` pairs, retained for a fixed
//! window so an attacker cannot resend a captured envelope.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

pub const DEFAULT_RETENTION: Duration = Duration::hours(1);

pub struct NonceTracker {
    seen: DashMap<String, DateTime<Utc>>,
    retention: Duration,
}

impl NonceTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            retention,
        }
    }

    pub fn default_config() -> Self {
        Self::new(DEFAULT_RETENTION)
    }

    fn key(from_agent: &str, nonce: &str) -> String {
        format!("{from_agent}\u{0}{nonce}")
    }

    /// Records `(from_agent, nonce)` at `now` and reports whether it's fresh.
    /// A pair seen again inside the retention window is a replay.
    pub fn check_and_record(&self, from_agent: &str, nonce: &str, now: DateTime<Utc>) -> bool {
        let key = Self::key(from_agent, nonce);
        if let Some(seen_at) = self.seen.get(&key) {
            if now - *seen_at <= self.retention {
                return false;
            }
        }
        self.seen.insert(key, now);
        true
    }

    /// Drops entries past the retention window; call periodically to bound
    /// memory.
    pub fn evict_expired(&self, now: DateTime<Utc>) {
        self.seen.retain(|_, seen_at| now - *seen_at <= self.retention);
    }
}
