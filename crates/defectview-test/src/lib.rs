//! defectview-test - Regression test framework for defectview
//!
//! Supports three modes, selected by the `REGTEST_MODE` environment
//! variable:
//!
//! - **Generate**: Create golden files for comparison
//! - **Compare**: Compare results with golden files (default)
//! - **Display**: Run tests without comparison (visual inspection)
//!
//! # Usage
//!
//! ```ignore
//! use defectview_test::{RegParams, fixtures};
//!
//! let mut rp = RegParams::new("block");
//! let src = fixtures::defect_dot(400, 400, 17, 230).unwrap();
//! rp.compare_values(76.0, out.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode, max_channel_diff};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // defectview-test is at crates/defectview-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
