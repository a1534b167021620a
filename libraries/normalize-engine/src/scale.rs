//! Scale factor resolution
//!
//! Turns [`AmplitudeAnalysis`] into a single multiplicative factor:
//!
//! ```text
//! avg_abs   = abs_sum / sample_count
//! scale     = target / avg_abs
//! max_scale = 32767 / peak
//! scale     = min(scale, max_scale)
//! ```
//!
//! The band check uses the uncapped factor: a stream whose average is
//! already within `1 ± tolerance` of the target is left alone. A capped
//! factor is always applied, unless the cap is exactly 1.0 and rewriting
//! would change nothing. Silent streams are never rescaled.

use crate::analyzer::AmplitudeAnalysis;
use crate::error::{NormalizeError, Result};
use crate::{DEFAULT_TARGET_AMPLITUDE, DEFAULT_TOLERANCE};
use std::fmt;

/// Largest magnitude a rescaled sample may take
pub const MAX_SAMPLE: f64 = i16::MAX as f64;

/// A strictly positive, finite multiplicative factor
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// `None` unless `value` is finite and > 0
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Factor that undoes this one
    pub fn inverse(self) -> Self {
        Self(1.0 / self.0)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{:.3}", self.0)
    }
}

/// Why a file was left as it is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// No non-zero samples
    Silent,
    /// The stream is already close enough to the target
    WithinTolerance { scale: ScaleFactor },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Silent => write!(f, "silent"),
            Self::WithinTolerance { scale } => write!(f, "already normalized ({})", scale),
        }
    }
}

/// Outcome of [`ScaleResolver::resolve`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleDecision {
    /// Rewrite every sample with `scale`
    Rescale {
        scale: ScaleFactor,
        /// Whether the clipping ceiling lowered the factor
        capped: bool,
    },
    /// Leave the file untouched
    Skip(SkipReason),
}

impl ScaleDecision {
    /// Whether rewriting (and re-encoding) should happen
    pub fn changed(&self) -> bool {
        matches!(self, Self::Rescale { .. })
    }

    /// The factor that was resolved, `None` for silent input
    pub fn scale(&self) -> Option<ScaleFactor> {
        match self {
            Self::Rescale { scale, .. } | Self::Skip(SkipReason::WithinTolerance { scale }) => {
                Some(*scale)
            }
            Self::Skip(SkipReason::Silent) => None,
        }
    }
}

/// Resolves the factor that brings a stream to the target average amplitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleResolver {
    target: f64,
    tolerance: f64,
}

impl Default for ScaleResolver {
    fn default() -> Self {
        Self {
            target: f64::from(DEFAULT_TARGET_AMPLITUDE),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ScaleResolver {
    /// # Arguments
    /// * `target` - Desired mean absolute sample value (> 0)
    /// * `tolerance` - Half-width of the skip band around 1.0, in `[0, 1)`
    pub fn new(target: f64, tolerance: f64) -> Result<Self> {
        if !(target.is_finite() && target > 0.0) {
            return Err(NormalizeError::InvalidArgument(format!(
                "target amplitude must be positive, got {}",
                target
            )));
        }
        if !(0.0..1.0).contains(&tolerance) {
            return Err(NormalizeError::InvalidArgument(format!(
                "tolerance must be in [0, 1), got {}",
                tolerance
            )));
        }
        Ok(Self { target, tolerance })
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Largest factor that keeps every sample within the 16-bit range
    pub fn max_safe_scale(stats: &AmplitudeAnalysis) -> Option<f64> {
        let peak = stats.peak();
        (peak > 0).then(|| MAX_SAMPLE / f64::from(peak))
    }

    pub fn resolve(&self, stats: &AmplitudeAnalysis) -> ScaleDecision {
        // abs_sum == 0 also covers the empty stream; both would divide by zero
        let (Some(avg_abs), Some(max_scale)) = (
            stats.average_abs().filter(|avg| *avg > 0.0),
            Self::max_safe_scale(stats),
        ) else {
            return ScaleDecision::Skip(SkipReason::Silent);
        };

        let uncapped = self.target / avg_abs;
        let capped = uncapped > max_scale;
        let value = if capped { max_scale } else { uncapped };

        // Non-silent input always yields a finite positive value
        let Some(scale) = ScaleFactor::new(value) else {
            return ScaleDecision::Skip(SkipReason::Silent);
        };

        let unchanged = if capped {
            value == 1.0
        } else {
            (uncapped - 1.0).abs() <= self.tolerance
        };

        if unchanged {
            ScaleDecision::Skip(SkipReason::WithinTolerance { scale })
        } else {
            ScaleDecision::Rescale { scale, capped }
        }
    }
}
