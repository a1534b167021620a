//! First pass: amplitude statistics of the sample stream

use crate::error::Result;
use crate::pcm::{read_sample, PcmFile, BYTES_PER_SAMPLE};
use std::fmt;

/// Amplitude statistics of one sample stream
///
/// `min_sample`/`max_sample` are seeded from the first sample, so an
/// all-positive stream reports its true minimum rather than 0. Both are 0
/// for an empty stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmplitudeAnalysis {
    /// Number of samples (all channels)
    pub sample_count: u64,
    /// Sum of absolute sample values
    pub abs_sum: u64,
    /// Smallest sample seen
    pub min_sample: i16,
    /// Largest sample seen
    pub max_sample: i16,
}

impl AmplitudeAnalysis {
    /// Largest absolute sample value
    ///
    /// Returned as `i32` because `|-32768|` does not fit in an `i16`.
    pub fn peak(&self) -> i32 {
        i32::from(self.max_sample).max(-i32::from(self.min_sample))
    }

    /// Mean absolute sample value, `None` for an empty stream
    pub fn average_abs(&self) -> Option<f64> {
        if self.sample_count == 0 {
            None
        } else {
            Some(self.abs_sum as f64 / self.sample_count as f64)
        }
    }

    /// Whether every sample is zero (or there are none)
    pub fn is_silent(&self) -> bool {
        self.abs_sum == 0
    }
}

impl fmt::Display for AmplitudeAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples, avg |x| {:.1}, min {}, max {}",
            self.sample_count,
            self.average_abs().unwrap_or(0.0),
            self.min_sample,
            self.max_sample
        )
    }
}

/// Incremental accumulator behind [`analyze`]
///
/// Exposed separately so in-memory sample buffers can be measured the same
/// way as files.
#[derive(Debug, Default)]
pub struct AmplitudeAnalyzer {
    stats: AmplitudeAnalysis,
}

impl AmplitudeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one sample
    #[inline]
    pub fn add_sample(&mut self, sample: i16) {
        let stats = &mut self.stats;
        if stats.sample_count == 0 {
            stats.min_sample = sample;
            stats.max_sample = sample;
        } else {
            stats.min_sample = stats.min_sample.min(sample);
            stats.max_sample = stats.max_sample.max(sample);
        }
        stats.abs_sum += u64::from(sample.unsigned_abs());
        stats.sample_count += 1;
    }

    /// Account for a slice of samples
    pub fn add_samples(&mut self, samples: &[i16]) {
        for &sample in samples {
            self.add_sample(sample);
        }
    }

    /// Account for little-endian sample bytes
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        for sample in bytes.chunks_exact(BYTES_PER_SAMPLE) {
            self.add_sample(read_sample(sample));
        }
    }

    pub fn finalize(self) -> AmplitudeAnalysis {
        self.stats
    }
}

/// Measure the whole sample region of `pcm`
///
/// Rewinds to the first sample before reading; the cursor is left at end of
/// stream.
pub fn analyze(pcm: &mut PcmFile) -> Result<AmplitudeAnalysis> {
    pcm.rewind()?;

    let mut analyzer = AmplitudeAnalyzer::new();
    while let Some(chunk) = pcm.next_chunk()? {
        analyzer.add_bytes(chunk);
    }

    let stats = analyzer.finalize();
    tracing::debug!("Analyzed {}: {}", pcm.path().display(), stats);
    Ok(stats)
}
