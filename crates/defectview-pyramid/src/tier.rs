//! Pyramid tier keys

use defectview_resample::{ResampleResult, ScaleGeometry};
use std::fmt;

/// One pre-computed resolution of the source image
///
/// Ordered by resolution: `Fifth < Half < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TierKey {
    /// 1/5 resolution
    Fifth,
    /// 1/2 resolution
    Half,
    /// The source itself
    Full,
}

impl TierKey {
    /// All tiers, coarsest first.
    pub const ALL: [TierKey; 3] = [TierKey::Fifth, TierKey::Half, TierKey::Full];

    /// Tiers generated in the background.
    pub const REDUCED: [TierKey; 2] = [TierKey::Half, TierKey::Fifth];

    /// Scale of this tier relative to the source.
    pub fn scale(self) -> f64 {
        match self {
            TierKey::Fifth => 0.2,
            TierKey::Half => 0.5,
            TierKey::Full => 1.0,
        }
    }

    /// Short label for logs and render info.
    pub fn label(self) -> &'static str {
        match self {
            TierKey::Fifth => "1/5",
            TierKey::Half => "1/2",
            TierKey::Full => "full",
        }
    }

    /// Slot index.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Next finer tier, `None` for `Full`.
    pub fn finer(self) -> Option<TierKey> {
        match self {
            TierKey::Fifth => Some(TierKey::Half),
            TierKey::Half => Some(TierKey::Full),
            TierKey::Full => None,
        }
    }

    /// Geometry of this tier for a `width x height` source.
    pub fn geometry(self, width: u32, height: u32) -> ResampleResult<ScaleGeometry> {
        ScaleGeometry::from_scale(width, height, self.scale())
    }
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(TierKey::Fifth < TierKey::Half);
        assert!(TierKey::Half < TierKey::Full);
        let mut v = vec![TierKey::Full, TierKey::Fifth, TierKey::Half];
        v.sort();
        assert_eq!(v, TierKey::ALL);
    }

    #[test]
    fn test_finer_chain() {
        assert_eq!(TierKey::Fifth.finer(), Some(TierKey::Half));
        assert_eq!(TierKey::Half.finer(), Some(TierKey::Full));
        assert_eq!(TierKey::Full.finer(), None);
    }

    #[test]
    fn test_geometry() {
        let g = TierKey::Fifth.geometry(4000, 3000).unwrap();
        assert_eq!((g.dst_w, g.dst_h), (800, 600));
        let g = TierKey::Half.geometry(7, 5).unwrap();
        assert_eq!((g.dst_w, g.dst_h), (3, 2));
    }
}
