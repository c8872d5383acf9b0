//! Retry delay scheduling for both the interactive send path (exponential
//! backoff with jitter) and the persistent outbound queue (a fixed coarse
//! schedule).

use chrono::Duration;
use rand::Rng;

/// Exponential backoff with full jitter: `delay = min(base * factor^attempt,
/// max) * uniform(0.5, 1.0)`. `attempt` is 0 for the first retry.
pub struct BackoffPolicy {
    base_delay: Duration,
    factor: f64,
    max_delay: Duration,
    max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, factor: f64, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            factor,
            max_delay,
            max_retries,
        }
    }

    /// Defaults for the interactive send path: 1s base, factor 2, 30s cap,
    /// 3 retries before the message moves to the persistent queue.
    pub fn interactive_default() -> Self {
        Self::new(Duration::seconds(1), 2.0, Duration::seconds(30), 3)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The delay to wait before attempt number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let base_ms = self.base_delay.num_milliseconds() as f64;
        let max_ms = self.max_delay.num_milliseconds() as f64;
        let exponential = base_ms * self.factor.powi(attempt as i32);
        let capped = exponential.min(max_ms);
        let jitter = rng.gen_range(0.5..1.0);
        Duration::milliseconds((capped * jitter) as i64)
    }
}

/// The persistent queue's coarse retry schedule: 1 min, 5 min, 30 min, 2 h,
/// 12 h. An attempt count beyond the schedule's length repeats the last
/// stage rather than growing further.
pub fn persistent_queue_schedule() -> Vec<Duration> {
    vec![
        Duration::minutes(1),
        Duration::minutes(5),
        Duration::minutes(30),
        Duration::hours(2),
        Duration::hours(12),
    ]
}

/// The delay before the next persistent-queue attempt, given how many
/// attempts have already been made.
pub fn persistent_queue_delay(attempts: u32) -> Duration {
    let schedule = persistent_queue_schedule();
    let index = (attempts as usize).min(schedule.len() - 1);
    schedule[index]
}
