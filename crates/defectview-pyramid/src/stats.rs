//! Tier generation counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cumulative pyramid build statistics
#[derive(Debug, Default)]
pub struct BuildStats {
    tiers_built: AtomicU64,
    stale_discarded: AtomicU64,
    placeholders: AtomicU64,
    failures: AtomicU64,
    build_nanos: AtomicU64,
}

/// Point-in-time copy of [`BuildStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStatsSnapshot {
    /// Final tiers stored
    pub tiers_built: u64,
    /// Background results dropped because the image changed
    pub stale_discarded: u64,
    /// Synchronous placeholders generated
    pub placeholders: u64,
    /// Failed tier builds
    pub failures: u64,
    /// Time spent in stored tier builds
    pub build_time: Duration,
}

impl BuildStats {
    pub(crate) fn record_built(&self, elapsed: Duration) {
        self.tiers_built.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.build_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_placeholder(&self) {
        self.placeholders.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> BuildStatsSnapshot {
        BuildStatsSnapshot {
            tiers_built: self.tiers_built.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            placeholders: self.placeholders.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            build_time: Duration::from_nanos(self.build_nanos.load(Ordering::Relaxed)),
        }
    }
}

impl BuildStatsSnapshot {
    /// Mean time per stored tier build.
    pub fn average_build_time(&self) -> Duration {
        if self.tiers_built == 0 {
            Duration::ZERO
        } else {
            self.build_time / u32::try_from(self.tiers_built).unwrap_or(u32::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let s = BuildStats::default();
        s.record_built(Duration::from_millis(30));
        s.record_built(Duration::from_millis(10));
        s.record_stale();
        s.record_placeholder();
        s.record_failure();
        let snap = s.snapshot();
        assert_eq!(snap.tiers_built, 2);
        assert_eq!(snap.stale_discarded, 1);
        assert_eq!(snap.placeholders, 1);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.build_time, Duration::from_millis(40));
        assert_eq!(snap.average_build_time(), Duration::from_millis(20));
    }

    #[test]
    fn test_empty_average() {
        assert_eq!(BuildStatsSnapshot::default().average_build_time(), Duration::ZERO);
    }
}
