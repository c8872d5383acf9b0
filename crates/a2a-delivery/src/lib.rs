//! # a2a-delivery
//!
//! The delivery engine: retry scheduling with exponential backoff and
//! jitter, a per-endpoint circuit breaker, and a tracker for the last-known
//! delivery status of each outbound envelope. This crate does not perform
//! network I/O itself — `a2a-node`'s egress pipeline drives an HTTP client
//! using the schedules and breaker decisions this crate computes.
//!
//! ## Modules
//!
//! - [`backoff`] — interactive exponential backoff and the persistent
//!   queue's coarse retry schedule
//! - [`circuit_breaker`] — the three-state breaker for a single endpoint
//! - [`breaker_registry`] — one breaker per endpoint
//! - [`delivery_tracker`] — last-known status per outbound message

pub mod backoff;
pub mod breaker_registry;
pub mod circuit_breaker;
pub mod delivery_tracker;

pub use backoff::{persistent_queue_delay, BackoffPolicy};
pub use breaker_registry::BreakerRegistry;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use delivery_tracker::{DeliveryRecord, DeliveryTracker};
