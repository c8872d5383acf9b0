//! One [`CircuitBreaker`] per destination endpoint, since a dead peer
//! should not throttle delivery to every other peer.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::circuit_breaker::{CircuitBreaker, CircuitState};

pub struct BreakerRegistry {
    breakers: DashMap<String, Mutex<CircuitBreaker>>,
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self {
            breakers: DashMap::new(),
        }
    }

    fn with_breaker<T>(&self, endpoint: &str, f: impl FnOnce(&mut CircuitBreaker) -> T) -> T {
        let entry = self
            .breakers
            .entry(endpoint.to_string())
            .or_insert_with(|| Mutex::new(CircuitBreaker::default_config()));
        let mut breaker = entry.lock().expect("circuit breaker lock poisoned");
        f(&mut breaker)
    }

    pub fn allow_request(&self, endpoint: &str, now: DateTime<Utc>) -> bool {
        self.with_breaker(endpoint, |b| b.allow_request(now))
    }

    pub fn record_success(&self, endpoint: &str) {
        self.with_breaker(endpoint, |b| b.record_success());
    }

    pub fn record_failure(&self, endpoint: &str, now: DateTime<Utc>) {
        self.with_breaker(endpoint, |b| b.record_failure(now));
    }

    pub fn state_of(&self, endpoint: &str) -> CircuitState {
        self.with_breaker(endpoint, |b| b.state())
    }
}
