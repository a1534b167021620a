//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use normalize_engine::{pcm, NormalizeError, Result, TranscodeStage, Transcoder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Transcoder whose "container" is already raw PCM
///
/// Decode copies the source to the raw path, encode copies it back, so whole
/// jobs run without ffmpeg. Every call is counted per path.
#[derive(Default)]
pub struct CopyTranscoder {
    decodes: Mutex<HashMap<PathBuf, usize>>,
    encodes: Mutex<HashMap<PathBuf, usize>>,
    delay: Option<Duration>,
}

impl CopyTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every decode to keep workers busy concurrently
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn decode_counts(&self) -> HashMap<PathBuf, usize> {
        self.decodes.lock().unwrap().clone()
    }

    pub fn encode_count(&self) -> usize {
        self.encodes.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn decode(&self, source: &Path, raw: &Path) -> Result<()> {
        *self
            .decodes
            .lock()
            .unwrap()
            .entry(source.to_path_buf())
            .or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        tokio::fs::copy(source, raw)
            .await
            .map_err(|e| NormalizeError::Collaborator {
                stage: TranscodeStage::Decode,
                diagnostic: e.to_string(),
            })?;
        Ok(())
    }

    async fn encode(&self, raw: &Path, destination: &Path) -> Result<()> {
        *self
            .encodes
            .lock()
            .unwrap()
            .entry(destination.to_path_buf())
            .or_default() += 1;

        tokio::fs::copy(raw, destination).await?;
        Ok(())
    }
}

/// Build the 44-byte-header WAV image the decoder is asked to produce
pub fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let data_size = (samples.len() * pcm::BYTES_PER_SAMPLE) as u32;
    let block_align = channels * 2;

    let mut wav = Vec::with_capacity(pcm::HEADER_LEN as usize + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

/// Samples following the 44-byte header
pub fn samples_of(wav: &[u8]) -> Vec<i16> {
    wav[pcm::HEADER_LEN as usize..]
        .chunks_exact(pcm::BYTES_PER_SAMPLE)
        .map(pcm::read_sample)
        .collect()
}

/// Write a canonical stereo 44.1 kHz PCM file
pub fn write_pcm(path: &Path, samples: &[i16]) {
    std::fs::write(path, wav_bytes(samples, 2, 44100)).unwrap();
}

/// Read back every sample of a PCM file
pub fn read_pcm(path: &Path) -> Vec<i16> {
    samples_of(&std::fs::read(path).unwrap())
}

/// Files left in a directory
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
