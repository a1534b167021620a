//! Per-file normalization job
//!
//! ```text
//! Decoding -> Analyzing -> Resolving -> Skipped ----------------------> Done
//!                                    \-> Rewriting -> Encoding ------> Done
//! (any step) -> Error
//! ```
//!
//! The temporary raw file is removed when the job ends, including on error.

use crate::analyzer::analyze;
use crate::error::{NormalizeError, Result};
use crate::pcm::PcmFile;
use crate::rewriter::rewrite;
use crate::scale::{ScaleDecision, ScaleFactor, ScaleResolver, SkipReason};
use crate::scratch::TempFileGuard;
use crate::transcoder::Transcoder;
use std::fmt;
use std::path::{Path, PathBuf};

/// Step a job is executing
///
/// Terminal states are a [`JobOutcome`] or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Decoding,
    Analyzing,
    Resolving,
    Rewriting,
    Encoding,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decoding => "decoding",
            Self::Analyzing => "analyzing",
            Self::Resolving => "resolving",
            Self::Rewriting => "rewriting",
            Self::Encoding => "encoding",
        };
        f.write_str(name)
    }
}

/// Terminal state of a successful job
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobOutcome {
    /// Samples were rescaled and the source re-encoded
    Normalized { scale: ScaleFactor, capped: bool },
    /// The source was left untouched
    Skipped(SkipReason),
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalized { scale, capped: false } => write!(f, "normalized ({})", scale),
            Self::Normalized { scale, capped: true } => {
                write!(f, "normalized ({}, limited by peak)", scale)
            }
            Self::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Analyze, resolve and (when needed) rewrite a raw PCM file in place
///
/// Synchronous; the dispatcher runs it on the blocking pool. A file rejected
/// by the accessor is not modified.
pub fn normalize_raw_file(path: &Path, resolver: &ScaleResolver) -> Result<ScaleDecision> {
    let mut pcm = PcmFile::open(path)?;

    let stats = analyze(&mut pcm)?;

    tracing::debug!("{} {}: {}", JobStage::Resolving, path.display(), stats);
    let decision = resolver.resolve(&stats);

    if let ScaleDecision::Rescale { scale, .. } = decision {
        tracing::debug!("{} {} with {}", JobStage::Rewriting, path.display(), scale);
        rewrite(&mut pcm, scale)?;
    }

    Ok(decision)
}

/// One source file on its way through decode, rescale and encode
#[derive(Debug, Clone)]
pub struct NormalizationJob {
    index: usize,
    source: PathBuf,
    raw: PathBuf,
    resolver: ScaleResolver,
}

impl NormalizationJob {
    /// # Arguments
    /// * `index` - Position in the batch, keeps temp names unique
    /// * `source` - File to normalize in place
    /// * `scratch_dir` - Directory for the temporary raw file
    /// * `resolver` - Target amplitude and skip tolerance
    pub fn new(
        index: usize,
        source: impl Into<PathBuf>,
        scratch_dir: &Path,
        resolver: ScaleResolver,
    ) -> Result<Self> {
        let source = source.into();
        let file_name = source.file_name().ok_or_else(|| {
            NormalizeError::InvalidArgument(format!("not a file path: {}", source.display()))
        })?;

        let mut raw_name = format!("{}-", index);
        raw_name.push_str(&file_name.to_string_lossy());
        raw_name.push_str(".temp.wav");

        Ok(Self {
            index,
            raw: scratch_dir.join(raw_name),
            source,
            resolver,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Temporary raw PCM path owned by this job
    pub fn raw_path(&self) -> &Path {
        &self.raw
    }

    /// Sibling of the source the encoder writes before it replaces the source
    ///
    /// Keeps the extension so the encoder can infer the container.
    fn staging_path(&self) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut name = format!(".{}.normalize-{}", stem, self.index);
        if let Some(ext) = self.source.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        self.source.with_file_name(name)
    }

    /// Execute the job to completion
    pub async fn run(self, transcoder: &dyn Transcoder) -> Result<JobOutcome> {
        let raw = TempFileGuard::new(self.raw.clone());

        tracing::debug!("[{}] {}: {}", self.index, JobStage::Decoding, self.source.display());
        transcoder.decode(&self.source, raw.path()).await?;

        tracing::debug!("[{}] {}", self.index, JobStage::Analyzing);
        let raw_path = raw.path().to_path_buf();
        let resolver = self.resolver;
        let decision =
            tokio::task::spawn_blocking(move || normalize_raw_file(&raw_path, &resolver)).await??;

        let (scale, capped) = match decision {
            ScaleDecision::Skip(reason) => {
                tracing::info!("Skipping {}: {}", self.source.display(), reason);
                return Ok(JobOutcome::Skipped(reason));
            }
            ScaleDecision::Rescale { scale, capped } => (scale, capped),
        };

        tracing::debug!("[{}] {} with {}", self.index, JobStage::Encoding, scale);
        let staged = TempFileGuard::new(self.staging_path());
        transcoder.encode(raw.path(), staged.path()).await?;

        if let Ok(metadata) = tokio::fs::metadata(&self.source).await {
            if let Err(e) = tokio::fs::set_permissions(staged.path(), metadata.permissions()).await
            {
                tracing::warn!("Failed to copy permissions to {}: {}", staged.path().display(), e);
            }
        }
        tokio::fs::rename(staged.path(), &self.source).await?;

        tracing::info!("Normalized {} ({})", self.source.display(), scale);
        Ok(JobOutcome::Normalized { scale, capped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::fixtures::{samples_of, wav_bytes};
    use tempfile::TempDir;

    #[test]
    fn test_raw_path_is_unique_per_index() {
        let scratch = Path::new("/tmp/scratch");
        let a = NormalizationJob::new(0, "/music/a/song.mp3", scratch, ScaleResolver::default())
            .unwrap();
        let b = NormalizationJob::new(1, "/music/b/song.mp3", scratch, ScaleResolver::default())
            .unwrap();

        assert_eq!(a.raw_path(), Path::new("/tmp/scratch/0-song.mp3.temp.wav"));
        assert_eq!(b.raw_path(), Path::new("/tmp/scratch/1-song.mp3.temp.wav"));
        assert_eq!(a.source(), Path::new("/music/a/song.mp3"));
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        let err = NormalizationJob::new(0, "/", Path::new("."), ScaleResolver::default());
        assert!(matches!(err, Err(NormalizeError::InvalidArgument(_))));
    }

    #[test]
    fn test_staging_path_keeps_extension() {
        let job = NormalizationJob::new(
            3,
            "/music/Song.MP3",
            Path::new("/tmp"),
            ScaleResolver::default(),
        )
        .unwrap();
        assert_eq!(job.staging_path(), Path::new("/music/.Song.normalize-3.MP3"));
    }

    #[test]
    fn test_normalize_raw_file_scenario() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.wav");
        std::fs::write(&path, wav_bytes(&[100; 8], 2, 44100)).unwrap();

        let resolver = ScaleResolver::new(1400.0, 0.1).unwrap();
        let decision = normalize_raw_file(&path, &resolver).unwrap();

        assert!(decision.changed());
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(samples_of(&bytes), vec![1400; 8]);
    }

    #[test]
    fn test_normalize_raw_file_leaves_silence_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("silent.wav");
        let original = wav_bytes(&[0; 64], 2, 44100);
        std::fs::write(&path, &original).unwrap();

        let decision = normalize_raw_file(&path, &ScaleResolver::default()).unwrap();
        assert_eq!(decision, ScaleDecision::Skip(SkipReason::Silent));
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_stage_display() {
        let stages = [
            JobStage::Decoding,
            JobStage::Analyzing,
            JobStage::Resolving,
            JobStage::Rewriting,
            JobStage::Encoding,
        ];
        let names: Vec<String> = stages.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            ["decoding", "analyzing", "resolving", "rewriting", "encoding"]
        );
    }

    #[test]
    fn test_outcome_display() {
        let scale = ScaleFactor::new(2.0).unwrap();
        let normalized = JobOutcome::Normalized {
            scale,
            capped: false,
        };
        assert_eq!(normalized.to_string(), "normalized (x2.000)");
        assert_eq!(
            JobOutcome::Skipped(SkipReason::Silent).to_string(),
            "skipped: silent"
        );
    }
}
