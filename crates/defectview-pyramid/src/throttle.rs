//! Minimum-interval gate for synchronous placeholder generation

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Default interval between placeholder generations.
pub const DEFAULT_PLACEHOLDER_INTERVAL: Duration = Duration::from_millis(50);

/// Allows an action at most once per interval
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a throttle. A zero interval never blocks.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take the slot if the interval has elapsed since the last grant.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last = self.last.lock();
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Forget the last grant, e.g. after a new image is loaded.
    pub fn reset(&self) {
        *self.last.lock() = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_INTERVAL)
    }
}
