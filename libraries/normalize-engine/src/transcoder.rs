//! Transcoding collaborator - FFmpeg wrapper for decode/encode around the
//! sample passes

use crate::error::{NormalizeError, Result, TranscodeStage};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Sample rate the decoder is asked to produce
pub const RAW_SAMPLE_RATE: u32 = 44100;

/// Channel count the decoder is asked to produce
pub const RAW_CHANNELS: u16 = 2;

/// Converts between a source container and raw 16-bit PCM
///
/// `decode` must produce a file with a 44-byte canonical WAV header followed
/// only by interleaved `s16le` samples. `encode` must write the source
/// container format inferred from `destination`.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn decode(&self, source: &Path, raw: &Path) -> Result<()>;

    async fn encode(&self, raw: &Path, destination: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(PathBuf::from("ffmpeg"))
    }
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            timeout: None,
        }
    }

    /// Kill the subprocess if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Check whether the configured binary can be executed at all
    pub async fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y") // Overwrite output file
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, stage: TranscodeStage) -> Result<()> {
        let output = cmd.output();
        let output = match self.timeout {
            // Dropping the future kills the child (kill_on_drop)
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                NormalizeError::Timeout {
                    stage,
                    seconds: limit.as_secs(),
                }
            })?,
            None => output.await,
        };

        let output = output.map_err(|e| NormalizeError::Collaborator {
            stage,
            diagnostic: format!("failed to run {}: {}", self.ffmpeg_path.display(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NormalizeError::Collaborator {
                stage,
                diagnostic: stderr.trim_end().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn decode(&self, source: &Path, raw: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(source)
            .arg("-bitexact") // No encoder tag in the header
            .arg("-map_metadata")
            .arg("-1") // Strip tags so `data` directly follows `fmt `
            .arg("-f")
            .arg("wav")
            .arg("-c:a")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg(RAW_SAMPLE_RATE.to_string())
            .arg("-ac")
            .arg(RAW_CHANNELS.to_string())
            .arg(raw);

        tracing::debug!("Decoding {} -> {}", source.display(), raw.display());
        self.run(cmd, TranscodeStage::Decode).await
    }

    async fn encode(&self, raw: &Path, destination: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("-i").arg(raw).arg(destination);

        tracing::debug!("Encoding {} -> {}", raw.display(), destination.display());
        self.run(cmd, TranscodeStage::Encode).await
    }
}
