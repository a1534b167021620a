//! Engine configuration
//!
//! One immutable value built by the caller and shared (behind an `Arc`) with
//! every worker.

use crate::error::{NormalizeError, Result};
use crate::scale::ScaleResolver;
use crate::{DEFAULT_TARGET_AMPLITUDE, DEFAULT_TOLERANCE, DEFAULT_WORKERS};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    target_amplitude: u32,
    tolerance: f64,
    workers: usize,
    scratch_root: Option<PathBuf>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_amplitude: DEFAULT_TARGET_AMPLITUDE,
            tolerance: DEFAULT_TOLERANCE,
            workers: DEFAULT_WORKERS,
            scratch_root: None,
        }
    }
}

impl NormalizeConfig {
    pub fn builder() -> NormalizeConfigBuilder {
        NormalizeConfigBuilder::default()
    }

    /// Desired mean absolute sample value
    pub fn target_amplitude(&self) -> u32 {
        self.target_amplitude
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of concurrent workers, always >= 1
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Parent of the batch scratch directory (`None` = system temp dir)
    pub fn scratch_root(&self) -> Option<&Path> {
        self.scratch_root.as_deref()
    }

    pub fn resolver(&self) -> ScaleResolver {
        // Validated in build()
        ScaleResolver::new(f64::from(self.target_amplitude), self.tolerance).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeConfigBuilder {
    target_amplitude: Option<u32>,
    tolerance: Option<f64>,
    workers: Option<usize>,
    scratch_root: Option<PathBuf>,
}

impl NormalizeConfigBuilder {
    pub fn target_amplitude(mut self, target: u32) -> Self {
        self.target_amplitude = Some(target);
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Values below 1 are raised to 1
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn build(self) -> Result<NormalizeConfig> {
        let target_amplitude = self.target_amplitude.unwrap_or(DEFAULT_TARGET_AMPLITUDE);
        if target_amplitude == 0 {
            return Err(NormalizeError::InvalidArgument(
                "target amplitude must be greater than zero".to_string(),
            ));
        }

        let tolerance = self.tolerance.unwrap_or(DEFAULT_TOLERANCE);
        ScaleResolver::new(f64::from(target_amplitude), tolerance)?;

        Ok(NormalizeConfig {
            target_amplitude,
            tolerance,
            workers: self.workers.unwrap_or(DEFAULT_WORKERS).max(1),
            scratch_root: self.scratch_root,
        })
    }
}
