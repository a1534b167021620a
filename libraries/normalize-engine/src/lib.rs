//! Batch amplitude normalization of audio files
//!
//! This crate provides:
//! - A buffered read/write cursor over raw 16-bit PCM files
//! - A two-pass engine: amplitude analysis, then in-place rescaling
//! - Scale resolution with a clipping ceiling and a skip tolerance
//! - A bounded worker pool that runs one decode/rescale/encode job per file
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  decode   ┌──────────────┐     ┌───────────────┐
//! │ Source file │ ────────► │ Raw PCM file │ ──► │   Analyzer    │
//! └─────────────┘           └──────────────┘     └───────────────┘
//!        ▲                         ▲                     │
//!        │ encode                  │ in place            ▼
//!        │                  ┌──────────────┐     ┌───────────────┐
//!        └───────────────── │   Rewriter   │ ◄── │ ScaleResolver │
//!                           └──────────────┘     └───────────────┘
//! ```
//!
//! Decoding and encoding are delegated to a [`Transcoder`]; the default
//! [`FfmpegTranscoder`] shells out to `ffmpeg`.
//!
//! # Example
//!
//! ```ignore
//! use normalize_engine::{Dispatcher, FfmpegTranscoder, NormalizeConfig};
//! use std::sync::Arc;
//!
//! let config = NormalizeConfig::builder().target_amplitude(1400).workers(8).build()?;
//! let dispatcher = Dispatcher::new(config, Arc::new(FfmpegTranscoder::default()));
//!
//! let summary = dispatcher.run(paths, |report| {
//!     if let Err(e) = &report.result {
//!         println!("ERROR {} {}", report.path.display(), e);
//!     }
//! }).await;
//! ```

#![deny(unsafe_code)]

mod analyzer;
mod config;
mod dispatcher;
mod error;
mod job;
pub mod pcm;
mod rewriter;
mod scale;
mod scratch;
mod transcoder;

pub use analyzer::{analyze, AmplitudeAnalysis, AmplitudeAnalyzer};
pub use config::{NormalizeConfig, NormalizeConfigBuilder};
pub use dispatcher::{BatchSummary, Dispatcher, JobReport};
pub use error::{NormalizeError, Result, TranscodeStage};
pub use job::{normalize_raw_file, JobOutcome, JobStage, NormalizationJob};
pub use pcm::PcmFile;
pub use rewriter::{rescale_sample, rescale_samples, rewrite};
pub use scale::{ScaleDecision, ScaleFactor, ScaleResolver, SkipReason, MAX_SAMPLE};
pub use scratch::{ScratchDir, TempFileGuard};
pub use transcoder::{FfmpegTranscoder, Transcoder, RAW_CHANNELS, RAW_SAMPLE_RATE};

/// Default mean absolute sample value files are scaled to
pub const DEFAULT_TARGET_AMPLITUDE: u32 = 1400;

/// Default number of concurrent jobs
pub const DEFAULT_WORKERS: usize = 8;

/// Default half-width of the "already normalized" band around 1.0
pub const DEFAULT_TOLERANCE: f64 = 0.1;
