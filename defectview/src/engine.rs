//! The render engine
//!
//! [`RenderEngine`] ties the pieces together: it owns the tier cache and
//! its builder, keeps the zoom state, picks a tier and an algorithm for
//! every frame and hands the result to a [`RenderSurface`].
//!
//! # Frame pipeline
//!
//! 1. The display size follows the dimension law on the source size.
//! 2. In the block defect band the frame is computed from the source
//!    itself, since block analysis needs every source pixel.
//! 3. Otherwise the best tier the cache can serve is used and the method is
//!    chosen from the effective scale between that tier and the display.
//! 4. Large working rasters are processed tile by tile.

use crate::controller::{DEFAULT_FIT_MARGIN, RenderMode, ScaleController};
use crate::error::{EngineError, EngineResult};
use crate::options::RenderOptions;
use crate::surface::RenderSurface;
use defectview_core::DecodedBitmap;
use defectview_pyramid::{
    BuildStatsSnapshot, InlineScheduler, PyramidBuilder, PyramidCache, PyramidError,
    TaskScheduler, TierKey, TierQuality, WorkerPool,
};
use defectview_resample::{
    BlockDefectParams, ChunkedExecutor, ResampleMethod, Resampler, ScaleGeometry,
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Description of the most recent frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInfo {
    /// Source width
    pub original_width: u32,
    /// Source height
    pub original_height: u32,
    /// Frame width
    pub display_width: u32,
    /// Frame height
    pub display_height: u32,
    /// Applied scale
    pub scale: f64,
    /// Applied scale in whole percent
    pub scale_percent: u32,
    /// Tier the frame was computed from
    pub active_tier: TierKey,
    /// Label of `active_tier`
    pub active_tier_label: &'static str,
    /// Whether that tier was a placeholder
    pub tier_quality: TierQuality,
    /// Algorithm used for the frame
    pub method: ResampleMethod,
    /// Rendering regime of `scale`
    pub mode: RenderMode,
    /// Image version the frame belongs to (0 before any load)
    pub version: u64,
}

impl RenderInfo {
    fn idle(scale: f64, version: u64, enhance: bool) -> Self {
        Self {
            original_width: 0,
            original_height: 0,
            display_width: 0,
            display_height: 0,
            scale,
            scale_percent: percent(scale),
            active_tier: TierKey::Full,
            active_tier_label: TierKey::Full.label(),
            tier_quality: TierQuality::Final,
            method: ResampleMethod::for_scale(scale, enhance),
            mode: ScaleController::render_mode(scale),
            version,
        }
    }
}

fn percent(scale: f64) -> u32 {
    (scale * 100.0).round() as u32
}

/// Zoomable, defect-preserving view over one source image at a time
pub struct RenderEngine<S: RenderSurface> {
    options: RenderOptions,
    controller: ScaleController,
    cache: Arc<PyramidCache>,
    builder: PyramidBuilder,
    executor: ChunkedExecutor,
    defect: BlockDefectParams,
    surface: S,
    last: Option<RenderInfo>,
}

impl<S: RenderSurface> RenderEngine<S> {
    /// Create an engine.
    ///
    /// Background tiers are built on a worker pool of
    /// `options.worker_threads` threads, or inline when that is 0.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOptions`] for rejected options.
    pub fn new(options: RenderOptions, surface: S) -> EngineResult<Self> {
        options.validate()?;
        let scheduler: Arc<dyn TaskScheduler> = if options.worker_threads > 0 {
            Arc::new(WorkerPool::new(options.worker_threads))
        } else {
            Arc::new(InlineScheduler)
        };
        Self::with_scheduler(options, surface, scheduler)
    }

    /// Create an engine that submits tier builds to `scheduler`.
    pub fn with_scheduler(
        options: RenderOptions,
        surface: S,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> EngineResult<Self> {
        options.validate()?;
        let cache = Arc::new(PyramidCache::new(options.placeholder_interval));
        let builder =
            PyramidBuilder::new(Arc::clone(&cache), scheduler).with_executor(options.executor());
        Ok(Self {
            controller: ScaleController::new(options.min_scale, options.max_scale),
            executor: options.executor(),
            defect: options.block_params(),
            options,
            cache,
            builder,
            surface,
            last: None,
        })
    }

    /// Replace the source image and render it at the current scale.
    ///
    /// The version advances and background tier builds are scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSource`] for an empty or malformed
    /// bitmap; the engine state is left untouched.
    pub fn load_image<B: DecodedBitmap + ?Sized>(&mut self, bitmap: &B) -> EngineResult<()> {
        let source = bitmap
            .to_pixel_buffer()
            .map_err(|e| EngineError::InvalidSource(e.to_string()))?;
        let (w, h) = source.dimensions();
        let version = self.cache.reset(source);
        info!("loaded {}x{} source as version {}", w, h, version);

        if self.options.use_pyramid {
            let tiers: &[TierKey] = if self.options.enhance_defects {
                &[TierKey::Half]
            } else {
                &TierKey::REDUCED
            };
            if let Err(e) = self.builder.schedule(tiers) {
                warn!("could not schedule tiers for version {}: {}", version, e);
            }
        }
        self.render()?;
        Ok(())
    }

    /// Apply `scale` (clamped) and render. Returns the applied scale.
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        let applied = self.controller.set_scale(scale);
        self.refresh();
        applied
    }

    /// Fit the image into a `width x height` container leaving `margin`
    /// (e.g. [`DEFAULT_FIT_MARGIN`]) and render. Returns the applied scale.
    pub fn fit_to_container(&mut self, width: u32, height: u32, margin: f64) -> f64 {
        let Some(source) = self.cache.source() else {
            return self.controller.scale();
        };
        let (src_w, src_h) = source.dimensions();
        let applied = self
            .controller
            .fit_to_container(width, height, src_w, src_h, margin);
        self.refresh();
        applied
    }

    /// [`fit_to_container`](Self::fit_to_container) with the default margin.
    pub fn fit(&mut self, width: u32, height: u32) -> f64 {
        self.fit_to_container(width, height, DEFAULT_FIT_MARGIN)
    }

    fn refresh(&mut self) {
        if !self.has_image() {
            return;
        }
        self.ensure_tier();
        if let Err(e) = self.render() {
            warn!("render at scale {} failed: {}", self.controller.scale(), e);
        }
    }

    /// Make sure the tier wanted at the current scale has at least a
    /// placeholder.
    fn ensure_tier(&self) {
        let scale = self.controller.scale();
        if self.renders_from_source(scale) {
            return;
        }
        let tier = ScaleController::desired_tier(scale);
        if tier == TierKey::Full {
            return;
        }
        if let Err(e) = self.cache.ensure_placeholder(tier) {
            warn!("placeholder for tier {} failed: {}", tier, e);
        }
    }

    fn renders_from_source(&self, scale: f64) -> bool {
        !self.options.use_pyramid
            || ResampleMethod::for_scale(scale, self.options.enhance_defects)
                == ResampleMethod::BlockDefect
    }

    /// Render a frame at the current scale and present it.
    ///
    /// Uses whatever the cache holds right now; call again after background
    /// tiers finish to pick them up.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::NoSource`] (wrapped) before the first load.
    pub fn render(&mut self) -> EngineResult<RenderInfo> {
        let scale = self.controller.scale();
        let version = self.cache.version();
        let enhance = self.options.enhance_defects;
        let source = self.cache.source().ok_or(PyramidError::NoSource)?;
        let (orig_w, orig_h) = source.dimensions();
        let display = ScaleGeometry::from_scale(orig_w, orig_h, scale)?;

        let entry = if self.renders_from_source(scale) {
            None
        } else {
            ScaleController::select_tier(scale, &self.cache)
        };
        let (tier, quality, working) = match entry {
            Some(e) => (e.tier, e.quality, e.buffer),
            None => (TierKey::Full, TierQuality::Final, source),
        };
        let (geom, method) = if tier == TierKey::Full {
            (display, ResampleMethod::for_scale(scale, enhance))
        } else {
            let geom = ScaleGeometry::to_size(
                working.width(),
                working.height(),
                display.dst_w,
                display.dst_h,
            )?;
            (geom, ResampleMethod::for_scale(geom.effective_scale(), enhance))
        };

        debug!(
            "render v{} at {:.3}: tier {} ({:?}), {} {}x{} -> {}x{}",
            version,
            scale,
            tier,
            quality,
            method,
            geom.src_w,
            geom.src_h,
            geom.dst_w,
            geom.dst_h
        );
        let resampler = Resampler::new(method).with_defect_params(self.defect);
        let frame = self.executor.run(&working, &geom, &resampler)?;
        self.surface.present(frame, geom.dst_w, geom.dst_h);

        let info = RenderInfo {
            original_width: orig_w,
            original_height: orig_h,
            display_width: geom.dst_w,
            display_height: geom.dst_h,
            scale,
            scale_percent: percent(scale),
            active_tier: tier,
            active_tier_label: tier.label(),
            tier_quality: quality,
            method,
            mode: ScaleController::render_mode(scale),
            version,
        };
        self.last = Some(info.clone());
        Ok(info)
    }

    /// Description of the current frame.
    ///
    /// Never describes a frame of an image that has since been replaced.
    pub fn info(&self) -> RenderInfo {
        let version = self.cache.version();
        match &self.last {
            Some(info) if info.version == version => info.clone(),
            _ => RenderInfo::idle(
                self.controller.scale(),
                version,
                self.options.enhance_defects,
            ),
        }
    }

    /// Whether an image is loaded.
    pub fn has_image(&self) -> bool {
        self.cache.version() > 0
    }

    /// Current applied scale.
    pub fn scale(&self) -> f64 {
        self.controller.scale()
    }

    /// Current image version.
    pub fn version(&self) -> u64 {
        self.cache.version()
    }

    /// Tier build counters.
    pub fn stats(&self) -> BuildStatsSnapshot {
        self.cache.stats()
    }

    /// The tier cache.
    pub fn pyramid(&self) -> &PyramidCache {
        &self.cache
    }

    /// Engine options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The display sink.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the display sink.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
