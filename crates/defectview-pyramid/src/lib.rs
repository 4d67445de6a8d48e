//! defectview-pyramid - Multi-resolution tier cache for defect-map rasters
//!
//! A loaded image is kept at three resolutions: the source itself and two
//! reduced tiers (1/2 and 1/5) built in the background. The cache is
//! versioned: loading a new image advances the version, and any background
//! result computed for an older version is discarded when it arrives.
//!
//! While a reduced tier is still being built the cache can produce a fast
//! placeholder for it, rate limited by a [`Throttle`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use defectview_core::PixelBuffer;
//! use defectview_pyramid::{InlineScheduler, PyramidBuilder, PyramidCache, TierKey};
//!
//! let cache = Arc::new(PyramidCache::default());
//! cache.reset(PixelBuffer::new_filled(100, 80, 0x808080ff).unwrap());
//! let builder = PyramidBuilder::new(Arc::clone(&cache), Arc::new(InlineScheduler));
//! builder.schedule_all().unwrap();
//! let fifth = cache.entry(TierKey::Fifth).unwrap();
//! assert_eq!(fifth.buffer.dimensions(), (20, 16));
//! ```

pub mod builder;
pub mod cache;
mod error;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod throttle;
pub mod tier;

pub use builder::{PyramidBuilder, TierJob, TierReducer, default_reducer};
pub use cache::{PyramidCache, TierEntry, TierQuality};
pub use error::{PyramidError, PyramidResult};
pub use scheduler::{DeferredQueue, InlineScheduler, Job, TaskScheduler, WorkerPool};
pub use state::{TierSlot, TierState};
pub use stats::{BuildStats, BuildStatsSnapshot};
pub use throttle::{DEFAULT_PLACEHOLDER_INTERVAL, Throttle};
pub use tier::TierKey;
