//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::{golden_dir, regout_dir};
use defectview_core::{PixelBuffer, color};
use defectview_io::ImageFormat;
use std::fs;
use std::path::Path;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Generate golden files
    Generate,
    /// Compare with golden files (default)
    #[default]
    Compare,
    /// Display mode - run without comparison
    Display,
}

impl RegTestMode {
    /// Parse mode from environment variable or string
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "generate" => Self::Generate,
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Largest per-channel difference between two equally sized buffers.
pub fn max_channel_diff(a: &PixelBuffer, b: &PixelBuffer) -> Option<u8> {
    if !a.sizes_equal(b) {
        return None;
    }
    let diff = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(&p, &q)| {
            let (r0, g0, b0, a0) = color::extract_rgba(p);
            let (r1, g1, b1, a1) = color::extract_rgba(q);
            r0.abs_diff(r1)
                .max(g0.abs_diff(g1))
                .max(b0.abs_diff(b1))
                .max(a0.abs_diff(a1))
        })
        .max()
        .unwrap_or(0);
    Some(diff)
}

/// Regression test parameters
///
/// Tracks the test name, the running comparison index, the mode and
/// every recorded failure.
pub struct RegParams {
    /// Name of the test (e.g., "block")
    pub test_name: String,
    /// Current test index (incremented before each test)
    index: usize,
    /// Test mode (generate, compare, or display)
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters configured from `REGTEST_MODE`.
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        // Ensure directories exist
        let _ = fs::create_dir_all(golden_dir());
        let _ = fs::create_dir_all(regout_dir());

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// Returns `true` if `|expected - actual| <= delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Compare two buffers for exact equality
    pub fn compare_pix(&mut self, pix1: &PixelBuffer, pix2: &PixelBuffer) -> bool {
        self.compare_pix_within(pix1, pix2, 0)
    }

    /// Compare two buffers allowing each channel to differ by `tolerance`
    pub fn compare_pix_within(
        &mut self,
        pix1: &PixelBuffer,
        pix2: &PixelBuffer,
        tolerance: u8,
    ) -> bool {
        self.index += 1;

        match max_channel_diff(pix1, pix2) {
            None => {
                let msg = format!(
                    "Failure in {}_reg: pix comparison for index {} - dimension mismatch \
                     {}x{} vs {}x{}",
                    self.test_name,
                    self.index,
                    pix1.width(),
                    pix1.height(),
                    pix2.width(),
                    pix2.height()
                );
                self.fail(msg);
                false
            }
            Some(diff) if diff > tolerance => {
                let msg = format!(
                    "Failure in {}_reg: pix comparison for index {} - max channel \
                     difference {} exceeds {}",
                    self.test_name, self.index, diff, tolerance
                );
                self.fail(msg);
                false
            }
            Some(_) => true,
        }
    }

    /// Write a buffer to `tests/regout` and check it against its golden file
    pub fn write_pix_and_check(&mut self, pix: &PixelBuffer, format: ImageFormat) -> TestResult<()> {
        self.index += 1;

        let local_path = format!(
            "{}/{}.{:02}.{}",
            regout_dir(),
            self.test_name,
            self.index,
            format.extension()
        );

        defectview_io::write_image(pix, &local_path, format).map_err(|e| {
            TestError::ImageWrite {
                path: local_path.clone(),
                message: e.to_string(),
            }
        })?;

        self.check_file(&local_path)
    }

    /// Check a file against its golden counterpart
    ///
    /// In generate mode, copies the file to golden.
    /// In compare mode, compares with the golden file pixel by pixel.
    /// In display mode, does nothing.
    fn check_file(&mut self, local_path: &str) -> TestResult<()> {
        let ext = Path::new(local_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let golden_path = format!(
            "{}/{}_golden.{:02}.{}",
            golden_dir(),
            self.test_name,
            self.index,
            ext
        );

        match self.mode {
            RegTestMode::Generate => {
                fs::copy(local_path, &golden_path)?;
                eprintln!("Generated: {}", golden_path);
            }
            RegTestMode::Compare => {
                if !Path::new(&golden_path).exists() {
                    let msg = format!(
                        "Failure in {}_reg: golden file not found: {}",
                        self.test_name, golden_path
                    );
                    self.fail(msg);
                    return Ok(());
                }

                let local_data = fs::read(local_path)?;
                let golden_data = fs::read(&golden_path)?;

                if local_data != golden_data && !compare_image_files(local_path, &golden_path) {
                    let msg = format!(
                        "Failure in {}_reg, index {}: comparing {} with {}",
                        self.test_name, self.index, local_path, golden_path
                    );
                    self.fail(msg);
                }
            }
            RegTestMode::Display => {}
        }

        Ok(())
    }

    /// Clean up and report results
    ///
    /// Returns `true` if all comparisons passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// Compare two image files pixel-by-pixel
fn compare_image_files(path1: &str, path2: &str) -> bool {
    match (
        defectview_io::read_image(path1),
        defectview_io::read_image(path2),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
