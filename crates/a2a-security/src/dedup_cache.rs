//! LRU-bounded dedup cache over envelope ids, with a TTL on top of the LRU's
//! capacity eviction so a quiet sender's old id doesn't linger forever just
//! because the cache never filled up.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::hours(1);

pub struct DedupCache {
    cache: Mutex<LruCache<Uuid, DateTime<Utc>>>,
    ttl: Duration,
}

impl DedupCache {
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

    /// Records `id` at `now` and reports whether it's fresh. An id already
    /// present and still within the TTL is a duplicate; one evicted by
    /// capacity, or present but stale, is treated as fresh and re-recorded.
    pub fn check_and_record(&self, id: Uuid, now: DateTime<Utc>) -> bool {
        let mut cache = self.cache.lock().expect("dedup cache lock poisoned");
        if let Some(seen_at) = cache.get(&id) {
            if now - *seen_at <= self.ttl {
                return false;
            }
        }
        cache.put(id, now);
        true
    }
}
