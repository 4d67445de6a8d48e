//! Versioned tier cache
//!
//! The cache holds at most one entry per tier, all tagged with the image
//! version they were computed from. Every write compares its version with
//! the current one under the entry lock, so a result computed for an image
//! that has since been replaced is dropped instead of stored.
//!
//! # Entry life cycle
//!
//! ```text
//! reset(v)            Full = source (Final), Half/Fifth absent
//! ensure_placeholder  Half/Fifth = fast Stretch (Placeholder), state unchanged
//! store_final(v)      Half/Fifth = background result (Final), state Ready
//! ```
//!
//! A placeholder never replaces a final entry.

use crate::error::{PyramidError, PyramidResult};
use crate::state::{TierSlot, TierState};
use crate::stats::{BuildStats, BuildStatsSnapshot};
use crate::throttle::Throttle;
use crate::tier::TierKey;
use defectview_core::PixelBuffer;
use defectview_resample::{ResampleMethod, Resampler};
use log::{debug, info, trace};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How an entry was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierQuality {
    /// Fast synchronous reduction, shown until the final build lands
    Placeholder,
    /// Background build (or the source itself)
    Final,
}

/// A cached tier raster
#[derive(Debug, Clone)]
pub struct TierEntry {
    /// Which tier
    pub tier: TierKey,
    /// Image version it was computed from
    pub version: u64,
    /// Placeholder or final
    pub quality: TierQuality,
    /// The pixels
    pub buffer: PixelBuffer,
}

/// Tier rasters for the currently loaded image
#[derive(Debug)]
pub struct PyramidCache {
    version: AtomicU64,
    slots: [TierSlot; 3],
    entries: RwLock<[Option<TierEntry>; 3]>,
    throttle: Throttle,
    stats: BuildStats,
}

impl Default for PyramidCache {
    fn default() -> Self {
        Self::new(crate::throttle::DEFAULT_PLACEHOLDER_INTERVAL)
    }
}

impl PyramidCache {
    /// Create an empty cache at version 0 with the given placeholder interval.
    pub fn new(placeholder_interval: Duration) -> Self {
        Self {
            version: AtomicU64::new(0),
            slots: Default::default(),
            entries: RwLock::new([None, None, None]),
            throttle: Throttle::new(placeholder_interval),
            stats: BuildStats::default(),
        }
    }

    /// Current image version (0 before the first load).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Replace the source: advance the version, drop every entry and mark
    /// the full tier ready. Returns the new version.
    pub fn reset(&self, source: PixelBuffer) -> u64 {
        let mut entries = self.entries.write();
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        for tier in TierKey::ALL {
            entries[tier.index()] = None;
            self.slots[tier.index()].store(version, TierState::Absent);
        }
        info!(
            "pyramid reset to version {} ({}x{})",
            version,
            source.width(),
            source.height()
        );
        entries[TierKey::Full.index()] = Some(TierEntry {
            tier: TierKey::Full,
            version,
            quality: TierQuality::Final,
            buffer: source,
        });
        self.slots[TierKey::Full.index()].store(version, TierState::Ready);
        self.throttle.reset();
        version
    }

    /// The source image of the current version.
    pub fn source(&self) -> Option<PixelBuffer> {
        self.entry(TierKey::Full).map(|e| e.buffer)
    }

    /// Generation state of `tier` for the current version.
    pub fn state(&self, tier: TierKey) -> TierState {
        self.slots[tier.index()].state_for(self.version())
    }

    /// Entry for `tier` if one exists for the current version.
    pub fn entry(&self, tier: TierKey) -> Option<TierEntry> {
        let entries = self.entries.read();
        entries[tier.index()]
            .as_ref()
            .filter(|e| e.version == self.version())
            .cloned()
    }

    /// Whether `tier` can be drawn from right now.
    pub fn has_entry(&self, tier: TierKey) -> bool {
        self.entry(tier).is_some()
    }

    /// Claim `tier` for a background build of `version`.
    pub fn begin_generation(&self, version: u64, tier: TierKey) -> bool {
        version == self.version() && self.slots[tier.index()].try_begin(version)
    }

    /// Store a background result. Returns `false` (and stores nothing) when
    /// `version` is no longer current.
    pub fn store_final(&self, version: u64, tier: TierKey, buffer: PixelBuffer) -> bool {
        let mut entries = self.entries.write();
        if version != self.version() {
            debug!(
                "discarding stale tier {} for version {} (current {})",
                tier,
                version,
                self.version()
            );
            self.stats.record_stale();
            return false;
        }
        entries[tier.index()] = Some(TierEntry {
            tier,
            version,
            quality: TierQuality::Final,
            buffer,
        });
        self.slots[tier.index()].transition(version, TierState::Generating, TierState::Ready);
        true
    }

    /// Release a failed build so the tier can be claimed again.
    pub fn fail_generation(&self, version: u64, tier: TierKey) {
        self.slots[tier.index()].transition(version, TierState::Generating, TierState::Absent);
        self.stats.record_failure();
    }

    /// Store a placeholder unless the version moved on or a final entry
    /// already exists.
    pub fn store_placeholder(&self, version: u64, tier: TierKey, buffer: PixelBuffer) -> bool {
        let mut entries = self.entries.write();
        if version != self.version() {
            return false;
        }
        let slot = &mut entries[tier.index()];
        if slot
            .as_ref()
            .is_some_and(|e| e.version == version && e.quality == TierQuality::Final)
        {
            return false;
        }
        *slot = Some(TierEntry {
            tier,
            version,
            quality: TierQuality::Placeholder,
            buffer,
        });
        true
    }

    /// Make sure `tier` has something to draw from.
    ///
    /// Returns the existing entry, or generates a fast placeholder from the
    /// source if the throttle allows. `Ok(None)` means the caller should
    /// fall back to another tier.
    pub fn ensure_placeholder(&self, tier: TierKey) -> PyramidResult<Option<TierEntry>> {
        if let Some(entry) = self.entry(tier) {
            return Ok(Some(entry));
        }
        let version = self.version();
        let source = self.source().ok_or(PyramidError::NoSource)?;
        if !self.throttle.try_acquire() {
            trace!("placeholder for tier {} throttled", tier);
            return Ok(None);
        }

        let geom = tier.geometry(source.width(), source.height())?;
        let buffer = Resampler::new(ResampleMethod::Stretch).resample(&source, &geom)?;
        if !self.store_placeholder(version, tier, buffer) {
            return Ok(self.entry(tier));
        }
        self.stats.record_placeholder();
        debug!(
            "placeholder for tier {} ({}x{}) at version {}",
            tier, geom.dst_w, geom.dst_h, version
        );
        Ok(self.entry(tier))
    }

    /// Build counters.
    pub fn stats(&self) -> BuildStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn discard_stale(&self) {
        self.stats.record_stale();
    }

    pub(crate) fn record_built(&self, elapsed: Duration) {
        self.stats.record_built(elapsed);
    }
}
