//! Resampling method selection and the `Resampler` front end

use crate::ResampleResult;
use crate::area::area_average_region;
use crate::block::{BlockDefectParams, block_defect_region};
use crate::geometry::ScaleGeometry;
use crate::kernel::{Kernel, kernel_region, kernel_window};
use crate::stretch::stretch_region;
use defectview_core::{PixelBuffer, TileRect};

/// Scale at and above which the direct stretch copy is used.
pub const STRETCH_MIN_SCALE: f64 = 0.7;
/// Scale below which block defect analysis takes over.
pub const BLOCK_DEFECT_MAX_SCALE: f64 = 0.3;
/// Without defect enhancement, area averaging also covers `[0.3, 0.5)`.
pub const PLAIN_AREA_MAX_SCALE: f64 = 0.5;

/// Resampling algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResampleMethod {
    /// Nearest source pixel, no interpolation
    Stretch,
    /// Exact area coverage averaging
    AreaAverage,
    /// Block analysis keeping boundaries and defects visible
    BlockDefect,
    /// Lanczos-2 separable kernel
    WeightedKernel,
    /// Lanczos-3 separable kernel (background tiers)
    SmoothKernel,
}

impl ResampleMethod {
    /// Choose the method for an effective display scale.
    ///
    /// | scale | enhanced | plain |
    /// |---|---|---|
    /// | `>= 0.7` | Stretch | Stretch |
    /// | `[0.5, 0.7)` | WeightedKernel | WeightedKernel |
    /// | `[0.3, 0.5)` | WeightedKernel | AreaAverage |
    /// | `< 0.3` | BlockDefect | AreaAverage |
    pub fn for_scale(scale: f64, enhance_defects: bool) -> Self {
        if scale >= STRETCH_MIN_SCALE {
            ResampleMethod::Stretch
        } else if scale >= BLOCK_DEFECT_MAX_SCALE {
            if !enhance_defects && scale < PLAIN_AREA_MAX_SCALE {
                ResampleMethod::AreaAverage
            } else {
                ResampleMethod::WeightedKernel
            }
        } else if enhance_defects {
            ResampleMethod::BlockDefect
        } else {
            ResampleMethod::AreaAverage
        }
    }

    /// Whether the output only contains computed integer values, so tiled
    /// and whole-image results must match exactly.
    pub fn is_exact(self) -> bool {
        !matches!(
            self,
            ResampleMethod::WeightedKernel | ResampleMethod::SmoothKernel
        )
    }

    /// Per-channel tolerance between tiled and whole-image output.
    pub fn tolerance(self) -> u8 {
        if self.is_exact() { 0 } else { 1 }
    }

    /// Short name for logs and render info.
    pub fn name(self) -> &'static str {
        match self {
            ResampleMethod::Stretch => "stretch",
            ResampleMethod::AreaAverage => "area-average",
            ResampleMethod::BlockDefect => "block-defect",
            ResampleMethod::WeightedKernel => "lanczos2",
            ResampleMethod::SmoothKernel => "lanczos3",
        }
    }
}

impl std::fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured resampling algorithm
///
/// # Examples
///
/// ```
/// use defectview_core::PixelBuffer;
/// use defectview_resample::{ResampleMethod, Resampler, ScaleGeometry};
///
/// let src = PixelBuffer::new_filled(100, 80, 0x808080ff).unwrap();
/// let geom = ScaleGeometry::from_scale(100, 80, 0.25).unwrap();
/// let out = Resampler::new(ResampleMethod::BlockDefect).resample(&src, &geom).unwrap();
/// assert_eq!(out.dimensions(), (25, 20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampler {
    /// Algorithm
    pub method: ResampleMethod,
    /// Parameters for [`ResampleMethod::BlockDefect`]
    pub defect: BlockDefectParams,
}

impl Resampler {
    /// Resampler with default block defect parameters.
    pub fn new(method: ResampleMethod) -> Self {
        Self {
            method,
            defect: BlockDefectParams::default(),
        }
    }

    /// Set block defect parameters.
    pub fn with_defect_params(mut self, defect: BlockDefectParams) -> Self {
        self.defect = defect;
        self
    }

    /// Resample the whole source.
    pub fn resample(&self, src: &PixelBuffer, geom: &ScaleGeometry) -> ResampleResult<PixelBuffer> {
        self.resample_region(src, geom, geom.dst_rect())
    }

    /// Resample the destination rectangle `rect` (global destination
    /// coordinates) into a `rect.w x rect.h` buffer.
    pub fn resample_region(
        &self,
        src: &PixelBuffer,
        geom: &ScaleGeometry,
        rect: TileRect,
    ) -> ResampleResult<PixelBuffer> {
        match self.method {
            ResampleMethod::Stretch => stretch_region(src, geom, rect),
            ResampleMethod::AreaAverage => area_average_region(src, geom, rect),
            ResampleMethod::BlockDefect => block_defect_region(src, geom, rect, &self.defect),
            ResampleMethod::WeightedKernel => kernel_region(src, geom, rect, Kernel::Lanczos2),
            ResampleMethod::SmoothKernel => kernel_region(src, geom, rect, Kernel::Lanczos3),
        }
    }

    /// Source rectangle read when computing `rect`.
    pub fn source_window(&self, geom: &ScaleGeometry, rect: TileRect) -> TileRect {
        match self.method {
            ResampleMethod::WeightedKernel => kernel_window(Kernel::Lanczos2, geom, rect),
            ResampleMethod::SmoothKernel => kernel_window(Kernel::Lanczos3, geom, rect),
            _ => geom.source_window(rect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_bands() {
        use ResampleMethod::*;
        assert_eq!(ResampleMethod::for_scale(5.0, true), Stretch);
        assert_eq!(ResampleMethod::for_scale(1.0, true), Stretch);
        assert_eq!(ResampleMethod::for_scale(0.7, true), Stretch);
        assert_eq!(ResampleMethod::for_scale(0.69, true), WeightedKernel);
        assert_eq!(ResampleMethod::for_scale(0.3, true), WeightedKernel);
        assert_eq!(ResampleMethod::for_scale(0.29, true), BlockDefect);
        assert_eq!(ResampleMethod::for_scale(0.05, true), BlockDefect);
    }

    #[test]
    fn test_method_bands_without_enhancement() {
        use ResampleMethod::*;
        assert_eq!(ResampleMethod::for_scale(0.8, false), Stretch);
        assert_eq!(ResampleMethod::for_scale(0.6, false), WeightedKernel);
        assert_eq!(ResampleMethod::for_scale(0.5, false), WeightedKernel);
        assert_eq!(ResampleMethod::for_scale(0.45, false), AreaAverage);
        assert_eq!(ResampleMethod::for_scale(0.1, false), AreaAverage);
    }

    #[test]
    fn test_tolerance() {
        assert_eq!(ResampleMethod::Stretch.tolerance(), 0);
        assert_eq!(ResampleMethod::BlockDefect.tolerance(), 0);
        assert_eq!(ResampleMethod::WeightedKernel.tolerance(), 1);
        assert_eq!(ResampleMethod::SmoothKernel.to_string(), "lanczos3");
    }

    #[test]
    fn test_resampler_dispatch_dimensions() {
        let src = PixelBuffer::new_filled(64, 48, 0x4060_80ff).unwrap();
        for &scale in &[2.0, 1.0, 0.5, 0.3, 0.19] {
            let geom = ScaleGeometry::from_scale(64, 48, scale).unwrap();
            let method = ResampleMethod::for_scale(scale, true);
            let out = Resampler::new(method).resample(&src, &geom).unwrap();
            assert_eq!(out.dimensions(), (geom.dst_w, geom.dst_h), "{method} @ {scale}");
        }
    }
}
