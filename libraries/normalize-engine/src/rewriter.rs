//! Second pass: apply the scale factor in place
//!
//! Chunks are processed in increasing offset order and each one is written
//! back over the bytes it was read from, so a write never touches data that
//! has not been read yet.

use crate::error::Result;
use crate::pcm::{read_sample, write_sample, PcmFile, BYTES_PER_SAMPLE};
use crate::scale::{ScaleFactor, MAX_SAMPLE};

/// Scale one sample, rounding half away from zero
///
/// The result is clamped to `±32767`; with a factor from
/// [`ScaleResolver`](crate::ScaleResolver) the clamp never engages.
#[inline]
pub fn rescale_sample(sample: i16, scale: ScaleFactor) -> i16 {
    let scaled = (f64::from(sample) * scale.value()).round();
    scaled.clamp(-MAX_SAMPLE, MAX_SAMPLE) as i16
}

/// Scale a buffer of samples in place
pub fn rescale_samples(samples: &mut [i16], scale: ScaleFactor) {
    for sample in samples {
        *sample = rescale_sample(*sample, scale);
    }
}

/// Rewrite every sample of `pcm` multiplied by `scale`
///
/// Returns the number of samples written.
pub fn rewrite(pcm: &mut PcmFile, scale: ScaleFactor) -> Result<u64> {
    pcm.rewind()?;

    let mut written = 0u64;
    while let Some(chunk) = pcm.next_chunk()? {
        for bytes in chunk.chunks_exact_mut(BYTES_PER_SAMPLE) {
            let sample = read_sample(bytes);
            write_sample(bytes, rescale_sample(sample, scale));
        }
        written += (chunk.len() / BYTES_PER_SAMPLE) as u64;
        pcm.write_back()?;
    }
    pcm.sync()?;

    tracing::debug!(
        "Rewrote {} samples of {} with {}",
        written,
        pcm.path().display(),
        scale
    );
    Ok(written)
}
