// Poll cadence for condition queries
use super::constants::{
    DEFAULT_POLL_INITIAL_INTERVAL, DEFAULT_POLL_MAX_INTERVAL, DEFAULT_POLL_MULTIPLIER,
    MIN_POLL_INTERVAL,
};
use std::time::Duration;

/// Exponential backoff with a cap, used between two `initctl cond get` queries
///
/// delay(n) = min(initial * multiplier^n, max), n = number of failed queries - 1
///
/// The caller additionally clamps every delay to the time left before its
/// deadline, so a wait never sleeps past it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Duration,
}

impl PollPolicy {
    /// Create a new poll policy
    ///
    /// # Arguments
    /// * `initial_interval` - Delay after the first failed query (floored at 10ms)
    /// * `multiplier` - Growth factor, values below 1.0 are treated as 1.0
    /// * `max_interval` - Cap on the delay (never below `initial_interval`)
    ///
    /// # Example
    /// ```text
    /// let policy = PollPolicy::new(Duration::from_millis(100), 2.0, Duration::from_secs(1));
    /// ```
    pub fn new(initial_interval: Duration, multiplier: f64, max_interval: Duration) -> Self {
        let initial_interval = initial_interval.max(MIN_POLL_INTERVAL);
        let multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        Self {
            initial_interval,
            multiplier,
            max_interval: max_interval.max(initial_interval),
        }
    }

    /// Same delay between every query
    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, 1.0, interval)
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Delay after the `attempt`-th failed query (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(64) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Delay after the `attempt`-th failed query, never longer than `remaining`
    pub fn next_delay(&self, attempt: u32, remaining: Duration) -> Duration {
        self.delay_for(attempt).min(remaining)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_POLL_INITIAL_INTERVAL,
            DEFAULT_POLL_MULTIPLIER,
            DEFAULT_POLL_MAX_INTERVAL,
        )
    }
}
