//! FFmpeg-backed job tests
//! Skipped when ffmpeg is not installed

mod common;

use common::wav_bytes;
use normalize_engine::{
    analyze, FfmpegTranscoder, JobOutcome, NormalizationJob, PcmFile, ScaleResolver,
    Transcoder,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Write a quiet 440 Hz stereo tone at 44.1 kHz
fn write_tone(path: &Path, amplitude: f32, seconds: f32) {
    let frames = (44100.0 * seconds) as usize;
    let mut samples = Vec::with_capacity(frames * 2);
    for n in 0..frames {
        let theta = n as f32 / 44100.0 * 2.0 * std::f32::consts::PI * 440.0;
        let sample = (theta.sin() * amplitude) as i16;
        samples.push(sample);
        samples.push(sample);
    }
    std::fs::write(path, wav_bytes(&samples, 2, 44100)).unwrap();
}

async fn ffmpeg() -> Option<FfmpegTranscoder> {
    let transcoder = FfmpegTranscoder::default().with_timeout(Some(Duration::from_secs(60)));
    if transcoder.is_available().await {
        Some(transcoder)
    } else {
        eprintln!("Skipping test: ffmpeg not available");
        None
    }
}

#[tokio::test]
async fn decode_produces_canonical_raw_file() {
    let Some(transcoder) = ffmpeg().await else {
        return;
    };
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("tone.wav");
    let raw = dir.path().join("tone.raw.wav");
    write_tone(&source, 1000.0, 0.5);

    transcoder.decode(&source, &raw).await.unwrap();

    let mut file = PcmFile::open(&raw).unwrap();
    assert_eq!(file.sample_count(), 44100);
    let stats = analyze(&mut file).unwrap();
    assert!(stats.peak() >= 990 && stats.peak() <= 1000);
}

#[tokio::test]
async fn quiet_tone_is_raised_to_target() {
    let Some(transcoder) = ffmpeg().await else {
        return;
    };
    let music = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let source = music.path().join("tone.wav");
    write_tone(&source, 500.0, 1.0);

    let resolver = ScaleResolver::new(1400.0, 0.1).unwrap();
    let job = NormalizationJob::new(0, &source, scratch.path(), resolver).unwrap();
    let outcome = job.run(&transcoder).await.unwrap();
    assert!(matches!(outcome, JobOutcome::Normalized { .. }));

    // Decode the result again and measure it
    let check = scratch.path().join("check.wav");
    transcoder.decode(&source, &check).await.unwrap();
    let stats = analyze(&mut PcmFile::open(&check).unwrap()).unwrap();
    let average = stats.average_abs().unwrap();
    assert!((average - 1400.0).abs() < 20.0, "average {}", average);
}
