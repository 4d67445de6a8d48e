//! Background tier generation
//!
//! [`PyramidBuilder::schedule`] claims each requested tier for the current
//! image version and hands a [`TierJob`] to the scheduler. A job reduces the
//! source captured at scheduling time and stores the result only if the
//! version is still current when it finishes.

use crate::cache::PyramidCache;
use crate::error::{PyramidError, PyramidResult};
use crate::scheduler::TaskScheduler;
use crate::tier::TierKey;
use defectview_core::PixelBuffer;
use defectview_resample::{ChunkedExecutor, ResampleMethod, Resampler, ScaleGeometry};
use log::{debug, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

/// Function that reduces a source raster to a tier geometry
pub type TierReducer =
    Arc<dyn Fn(&PixelBuffer, &ScaleGeometry) -> PyramidResult<PixelBuffer> + Send + Sync>;

/// Default reducer: Lanczos-3 smoothing, tiled by `executor` when the
/// source exceeds its threshold.
pub fn default_reducer(executor: ChunkedExecutor) -> TierReducer {
    let resampler = Resampler::new(ResampleMethod::SmoothKernel);
    Arc::new(
        move |src: &PixelBuffer, geom: &ScaleGeometry| -> PyramidResult<PixelBuffer> {
            Ok(executor.run(src, geom, &resampler)?)
        },
    )
}

/// Schedules tier builds for a [`PyramidCache`]
#[derive(Clone)]
pub struct PyramidBuilder {
    cache: Arc<PyramidCache>,
    scheduler: Arc<dyn TaskScheduler>,
    reducer: TierReducer,
}

impl PyramidBuilder {
    /// Create a builder using the default reducer and executor.
    pub fn new(cache: Arc<PyramidCache>, scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self {
            cache,
            scheduler,
            reducer: default_reducer(ChunkedExecutor::default()),
        }
    }

    /// Use the default reducer with `executor` deciding when to tile.
    pub fn with_executor(mut self, executor: ChunkedExecutor) -> Self {
        self.reducer = default_reducer(executor);
        self
    }

    /// Replace the reduction function.
    pub fn with_reducer<F>(mut self, reducer: F) -> Self
    where
        F: Fn(&PixelBuffer, &ScaleGeometry) -> PyramidResult<PixelBuffer> + Send + Sync + 'static,
    {
        self.reducer = Arc::new(reducer);
        self
    }

    /// The cache results are stored into.
    pub fn cache(&self) -> &Arc<PyramidCache> {
        &self.cache
    }

    /// The scheduler jobs are submitted to.
    pub fn scheduler(&self) -> &Arc<dyn TaskScheduler> {
        &self.scheduler
    }

    /// Schedule builds for `tiers` at the current version.
    ///
    /// Tiers that are already generating or ready are skipped, as is
    /// `Full`. Returns the number of jobs submitted.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::NoSource`] before the first load and
    /// [`PyramidError::SchedulerClosed`] if the scheduler refuses a job
    /// (the claimed tier is released again).
    pub fn schedule(&self, tiers: &[TierKey]) -> PyramidResult<usize> {
        let version = self.cache.version();
        let source = self.cache.source().ok_or(PyramidError::NoSource)?;
        let mut submitted = 0;
        for &tier in tiers {
            if tier == TierKey::Full || !self.cache.begin_generation(version, tier) {
                continue;
            }
            let job = TierJob {
                version,
                tier,
                source: source.clone(),
                cache: Arc::clone(&self.cache),
                reducer: Arc::clone(&self.reducer),
            };
            if let Err(e) = self.scheduler.submit(Box::new(move || job.run())) {
                self.cache.fail_generation(version, tier);
                return Err(e);
            }
            debug!("scheduled tier {} for version {}", tier, version);
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Schedule every reduced tier.
    pub fn schedule_all(&self) -> PyramidResult<usize> {
        self.schedule(&TierKey::REDUCED)
    }
}

/// One background tier build
pub struct TierJob {
    version: u64,
    tier: TierKey,
    source: PixelBuffer,
    cache: Arc<PyramidCache>,
    reducer: TierReducer,
}

impl TierJob {
    /// Build the tier and store it if the version is still current.
    ///
    /// A failure (error or panic in the reducer) is logged and releases the
    /// tier; nothing else in the cache is touched.
    pub fn run(self) {
        if self.version != self.cache.version() {
            debug!(
                "skipping tier {} for stale version {}",
                self.tier, self.version
            );
            self.cache.discard_stale();
            return;
        }

        let start = Instant::now();
        match self.build() {
            Ok(buffer) => {
                if self.cache.store_final(self.version, self.tier, buffer) {
                    let elapsed = start.elapsed();
                    self.cache.record_built(elapsed);
                    debug!(
                        "tier {} ready for version {} in {:?}",
                        self.tier, self.version, elapsed
                    );
                }
            }
            Err(e) => {
                warn!("{e}");
                self.cache.fail_generation(self.version, self.tier);
            }
        }
    }

    fn build(&self) -> PyramidResult<PixelBuffer> {
        let failure = |reason: String| PyramidError::TierGenerationFailure {
            tier: self.tier,
            reason,
        };
        let geom = self
            .tier
            .geometry(self.source.width(), self.source.height())
            .map_err(|e| failure(e.to_string()))?;
        let reducer = &self.reducer;
        match catch_unwind(AssertUnwindSafe(|| reducer(&self.source, &geom))) {
            Ok(Ok(buffer)) if buffer.dimensions() == (geom.dst_w, geom.dst_h) => Ok(buffer),
            Ok(Ok(buffer)) => Err(failure(format!(
                "reducer returned {}x{}, expected {}x{}",
                buffer.width(),
                buffer.height(),
                geom.dst_w,
                geom.dst_h
            ))),
            Ok(Err(e)) => Err(failure(e.to_string())),
            Err(_) => Err(failure("reducer panicked".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TierQuality;
    use crate::scheduler::{DeferredQueue, InlineScheduler};
    use crate::state::TierState;
    use defectview_core::color;

    fn source(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::new_filled(w, h, color::compose_rgb(40, 80, 120)).unwrap()
    }

    #[test]
    fn test_inline_build() {
        let cache = Arc::new(PyramidCache::default());
        cache.reset(source(50, 30));
        let builder = PyramidBuilder::new(Arc::clone(&cache), Arc::new(InlineScheduler));
        assert_eq!(builder.schedule_all().unwrap(), 2);

        let half = cache.entry(TierKey::Half).unwrap();
        assert_eq!(half.quality, TierQuality::Final);
        assert_eq!(half.buffer.dimensions(), (25, 15));
        assert_eq!(half.buffer.get_rgb(10, 7), Some((40, 80, 120)));
        assert_eq!(cache.entry(TierKey::Fifth).unwrap().buffer.dimensions(), (10, 6));
        assert_eq!(cache.stats().tiers_built, 2);

        // already ready
        assert_eq!(builder.schedule_all().unwrap(), 0);
    }

    #[test]
    fn test_schedule_is_idempotent_while_generating() {
        let cache = Arc::new(PyramidCache::default());
        cache.reset(source(20, 20));
        let queue = Arc::new(DeferredQueue::new());
        let builder = PyramidBuilder::new(Arc::clone(&cache), queue.clone());
        assert_eq!(builder.schedule(&[TierKey::Half, TierKey::Full]).unwrap(), 1);
        assert_eq!(builder.schedule(&[TierKey::Half]).unwrap(), 0);
        assert_eq!(cache.state(TierKey::Half), TierState::Generating);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(cache.state(TierKey::Half), TierState::Ready);
    }

    #[test]
    fn test_schedule_without_source() {
        let cache = Arc::new(PyramidCache::default());
        let builder = PyramidBuilder::new(cache, Arc::new(InlineScheduler));
        assert!(matches!(builder.schedule_all(), Err(PyramidError::NoSource)));
    }

    #[test]
    fn test_reducer_error_releases_tier() {
        let cache = Arc::new(PyramidCache::default());
        cache.reset(source(20, 20));
        let builder = PyramidBuilder::new(Arc::clone(&cache), Arc::new(InlineScheduler))
            .with_reducer(|_, geom| {
                Err(PyramidError::TierGenerationFailure {
                    tier: TierKey::Half,
                    reason: format!("refused {}x{}", geom.dst_w, geom.dst_h),
                })
            });
        assert_eq!(builder.schedule_all().unwrap(), 2);
        assert_eq!(cache.state(TierKey::Half), TierState::Absent);
        assert_eq!(cache.state(TierKey::Fifth), TierState::Absent);
        assert_eq!(cache.stats().failures, 2);
        assert!(cache.source().is_some());
    }

    #[test]
    fn test_wrong_size_is_failure() {
        let cache = Arc::new(PyramidCache::default());
        cache.reset(source(20, 20));
        let builder = PyramidBuilder::new(Arc::clone(&cache), Arc::new(InlineScheduler))
            .with_reducer(|src, _| Ok(src.clone()));
        builder.schedule(&[TierKey::Half]).unwrap();
        assert!(!cache.has_entry(TierKey::Half));
        assert_eq!(cache.stats().failures, 1);
    }
}
