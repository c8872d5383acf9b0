//! Caches the outcome of a signature verification keyed on
//! SHA-256(signature || publicKey), so a burst of retried or duplicated
//! deliveries doesn't re-run Ed25519 verification for every copy.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use sha2::{Digest, Sha256};

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::minutes(5);

fn cache_key(signature_b64: &str, public_key_b64: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature_b64.as_bytes());
    hasher.update(public_key_b64.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct VerificationCache {
    cache: Mutex<LruCache<String, (bool, DateTime<Utc>)>>,
    ttl: Duration,
}

impl VerificationCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(
            // DEFAULT_CAPACITY is a nonzero literal; this arm is unreachable.
            NonZeroUsize::MIN,
        ));
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn default_config() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Returns the cached verification result for this (signature, key)
    /// pair if it's still within the TTL.
    pub fn get(&self, signature_b64: &str, public_key_b64: &str, now: DateTime<Utc>) -> Option<bool> {
        let key = cache_key(signature_b64, public_key_b64);
        let mut cache = self.cache.lock().expect("verification cache lock poisoned");
        match cache.get(&key) {
            Some((valid, cached_at)) if now - *cached_at <= self.ttl => Some(*valid),
            _ => None,
        }
    }

    pub fn record(&self, signature_b64: &str, public_key_b64: &str, valid: bool, now: DateTime<Utc>) {
        let key = cache_key(signature_b64, public_key_b64);
        self.cache
            .lock()
            .expect("verification cache lock poisoned")
            .put(key, (valid, now));
    }
}
