//! Zoom state and tier selection

use defectview_pyramid::{PyramidCache, TierEntry, TierKey};
use defectview_resample::method::{BLOCK_DEFECT_MAX_SCALE, STRETCH_MIN_SCALE};
use log::trace;
use std::fmt;

/// Default margin left around the image by `fit_to_container`.
pub const DEFAULT_FIT_MARGIN: f64 = 0.95;

/// Largest scale served from the 1/5 tier.
pub const FIFTH_TIER_MAX_SCALE: f64 = 0.25;
/// Largest scale served from the 1/2 tier.
pub const HALF_TIER_MAX_SCALE: f64 = 0.75;

/// Rendering regime for a scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Direct pixel copy (s >= 0.7)
    Standard,
    /// Kernel reduction (0.3 <= s < 0.7)
    Optimized,
    /// Defect-preserving block analysis (s < 0.3)
    Enhanced,
}

impl RenderMode {
    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Standard => "standard",
            RenderMode::Optimized => "optimized",
            RenderMode::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clamped zoom scale plus the policies derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleController {
    min_scale: f64,
    max_scale: f64,
    scale: f64,
}

impl ScaleController {
    /// Create a controller at scale 1.0 (clamped into range).
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            scale: 1.0f64.clamp(min_scale, max_scale),
        }
    }

    /// Current scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scale bounds.
    pub fn range(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    /// Apply `scale` clamped into range and return what was applied.
    ///
    /// NaN leaves the current scale unchanged; infinities clamp.
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.scale;
        }
        self.scale = scale.clamp(self.min_scale, self.max_scale);
        self.scale
    }

    /// Scale that fits a `src_w x src_h` image into `width x height` with
    /// `margin` to spare, applied through [`set_scale`](Self::set_scale).
    pub fn fit_to_container(
        &mut self,
        width: u32,
        height: u32,
        src_w: u32,
        src_h: u32,
        margin: f64,
    ) -> f64 {
        if src_w == 0 || src_h == 0 {
            return self.scale;
        }
        let fit = (f64::from(width) / f64::from(src_w)).min(f64::from(height) / f64::from(src_h));
        self.set_scale(fit * margin)
    }

    /// Tier that best matches `scale`.
    pub fn desired_tier(scale: f64) -> TierKey {
        if scale <= FIFTH_TIER_MAX_SCALE {
            TierKey::Fifth
        } else if scale <= HALF_TIER_MAX_SCALE {
            TierKey::Half
        } else {
            TierKey::Full
        }
    }

    /// First tier from the desired one towards `Full` that `cache` can
    /// serve right now.
    ///
    /// Never starts any work; `Full` is always servable once a source is
    /// loaded, so `None` means nothing is loaded.
    pub fn select_tier(scale: f64, cache: &PyramidCache) -> Option<TierEntry> {
        let mut tier = Some(Self::desired_tier(scale));
        while let Some(t) = tier {
            if let Some(entry) = cache.entry(t) {
                trace!("scale {scale:.3} served from tier {t} ({:?})", entry.quality);
                return Some(entry);
            }
            tier = t.finer();
        }
        None
    }

    /// Rendering regime for `scale`.
    pub fn render_mode(scale: f64) -> RenderMode {
        if scale >= STRETCH_MIN_SCALE {
            RenderMode::Standard
        } else if scale >= BLOCK_DEFECT_MAX_SCALE {
            RenderMode::Optimized
        } else {
            RenderMode::Enhanced
        }
    }
}
